//! Core pixel formats and their RGBA unpackers

use rh_core::VideoError;

/// Pixel encodings a core can negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 0RGB1555, the libretro default
    #[default]
    Rgb1555 = 0,
    /// XRGB8888 stored little-endian, so bytes are B, G, R, X
    Xrgb8888 = 1,
    /// RGB565 stored little-endian
    Rgb565 = 2,
}

/// Converts one source pixel (exactly `bpp` bytes) to RGBA
pub type Unpacker = fn(&[u8]) -> [u8; 4];

impl PixelFormat {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(PixelFormat::Rgb1555),
            1 => Some(PixelFormat::Xrgb8888),
            2 => Some(PixelFormat::Rgb565),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Bytes per pixel
    pub fn bpp(self) -> usize {
        match self {
            PixelFormat::Xrgb8888 => 4,
            PixelFormat::Rgb1555 | PixelFormat::Rgb565 => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb1555 => "0RGB1555",
            PixelFormat::Xrgb8888 => "XRGB8888",
            PixelFormat::Rgb565 => "RGB565",
        }
    }

    /// 0RGB1555 negotiates fine but has no converter.
    pub fn unpacker(self) -> Result<Unpacker, VideoError> {
        match self {
            PixelFormat::Rgb565 => Ok(rgb565),
            PixelFormat::Xrgb8888 => Ok(xrgb8888),
            PixelFormat::Rgb1555 => Err(VideoError::UnsupportedPixelFormat(self.name())),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name(), self.bpp())
    }
}

#[inline]
pub fn rgb565(src: &[u8]) -> [u8; 4] {
    let px = u16::from_le_bytes([src[0], src[1]]);
    [
        ((px >> 8) & 0xF8) as u8,
        ((px >> 3) & 0xFC) as u8,
        ((px << 3) & 0xF8) as u8,
        0xFF,
    ]
}

#[inline]
pub fn xrgb8888(src: &[u8]) -> [u8; 4] {
    [src[2], src[1], src[0], 0xFF]
}
