//! Audio/video description a core reports after loading a game

/// Static information about a core
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    pub valid_extensions: String,
    /// The core reads the ROM itself and only wants its path
    pub need_fullpath: bool,
    pub block_extract: bool,
}

/// Frame geometry in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
}

impl Geometry {
    /// Only base size changes matter for the viewport
    pub fn differs_from(&self, other: &Geometry) -> bool {
        self.base_width != other.base_width || self.base_height != other.base_height
    }

    pub fn max_pixels(&self) -> usize {
        self.max_width as usize * self.max_height as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timing {
    pub fps: f64,
    pub sample_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvInfo {
    pub geometry: Geometry,
    pub timing: Timing,
}
