//! Rotation and flip coordinate mapping
//!
//! All mappings take source coordinates and the source size. Rotations are
//! counter-clockwise.

/// Screen rotation requested by a core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Libretro sends 0..=3, anything larger wraps
    pub fn from_raw(value: u32) -> Self {
        match value % 4 {
            1 => Rotation::R90,
            2 => Rotation::R180,
            3 => Rotation::R270,
            _ => Rotation::R0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// 90 and 270 swap width and height
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    pub fn inverse(self) -> Self {
        match self {
            Rotation::R90 => Rotation::R270,
            Rotation::R270 => Rotation::R90,
            r => r,
        }
    }

    pub fn output_size(self, w: usize, h: usize) -> (usize, usize) {
        if self.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Destination of source pixel `(x, y)` in a `w`x`h` image
    #[inline]
    pub fn map(self, x: usize, y: usize, w: usize, h: usize) -> (usize, usize) {
        match self {
            Rotation::R0 => (x, y),
            Rotation::R90 => (y, w - 1 - x),
            Rotation::R180 => (w - 1 - x, h - 1 - y),
            Rotation::R270 => (h - 1 - y, x),
        }
    }
}

/// Rotation plus the vertical flip GL framebuffers need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transform {
    pub rotation: Rotation,
    pub flip_y: bool,
}

impl Transform {
    pub fn new(rotation: Rotation, flip_y: bool) -> Self {
        Self { rotation, flip_y }
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::R0 && !self.flip_y
    }

    pub fn output_size(&self, w: usize, h: usize) -> (usize, usize) {
        self.rotation.output_size(w, h)
    }

    /// Destination of source pixel `(x, y)`; the flip happens before rotating
    #[inline]
    pub fn map(&self, x: usize, y: usize, w: usize, h: usize) -> (usize, usize) {
        let y = if self.flip_y { h - 1 - y } else { y };
        self.rotation.map(x, y, w, h)
    }

    /// Source pixel that lands on destination `(dx, dy)`
    #[inline]
    pub fn source_of(&self, dx: usize, dy: usize, w: usize, h: usize) -> (usize, usize) {
        let (ow, oh) = self.output_size(w, h);
        let (x, y) = self.rotation.inverse().map(dx, dy, ow, oh);
        if self.flip_y {
            (x, h - 1 - y)
        } else {
            (x, y)
        }
    }
}
