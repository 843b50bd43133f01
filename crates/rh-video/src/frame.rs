//! RGBA frames

/// Raw frame as delivered by a core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    /// Bytes per source row, may exceed `width * bpp`
    pub stride: usize,
}

impl FrameInfo {
    pub fn new(width: u32, height: u32, stride: usize) -> Self {
        Self {
            width,
            height,
            stride,
        }
    }
}

/// Tightly packed RGBA8 image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pix: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pix: vec![0; width * height * 4],
            width,
            height,
        }
    }

    /// Empty frame able to hold `pixels` without reallocating
    pub fn with_capacity(pixels: usize) -> Self {
        Self {
            pix: Vec::with_capacity(pixels << 2),
            width: 0,
            height: 0,
        }
    }

    /// Wraps existing RGBA bytes
    pub fn from_rgba(width: usize, height: usize, pix: Vec<u8>) -> Option<Self> {
        (pix.len() == width * height * 4).then_some(Self { pix, width, height })
    }

    pub(crate) fn reshape(&mut self, width: usize, height: usize) {
        self.pix.resize(width * height * 4, 0);
        self.width = width;
        self.height = height;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width << 2
    }

    pub fn capacity_pixels(&self) -> usize {
        self.pix.capacity() >> 2
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pix
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pix
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y * self.stride() + (x << 2);
        let p = &self.pix[at..at + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pix
    }
}
