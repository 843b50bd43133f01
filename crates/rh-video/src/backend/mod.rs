//! Graphics contexts for hardware-rendered cores

pub mod null;

use crate::format::PixelFormat;
use rh_core::VideoError;

/// Context type a core asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextType {
    #[default]
    None,
    OpenGl,
    OpenGlEs2,
    OpenGlCore,
    OpenGlEs3,
    OpenGlEsVersion,
    Vulkan,
    Dummy,
    Unknown(u32),
}

impl ContextType {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => ContextType::None,
            1 => ContextType::OpenGl,
            2 => ContextType::OpenGlEs2,
            3 => ContextType::OpenGlCore,
            4 => ContextType::OpenGlEs3,
            5 => ContextType::OpenGlEsVersion,
            6 => ContextType::Vulkan,
            0x7fff_ffff => ContextType::Dummy,
            v => ContextType::Unknown(v),
        }
    }
}

/// Parameters for creating a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextConfig {
    pub context: ContextType,
    /// Maximum frame size the core declared
    pub width: u32,
    pub height: u32,
    /// Let the provider pick the version
    pub auto_context: bool,
    pub version_major: u32,
    pub version_minor: u32,
    pub depth: bool,
    pub stencil: bool,
}

/// A thread-affine GPU context.
///
/// The host binds it right before every core call that may render and
/// releases it right after, on the thread that makes the call.
pub trait GraphicsContext: Send + Sync {
    /// Create the context and its offscreen framebuffer
    fn init(&self, config: &ContextConfig) -> Result<(), VideoError>;

    /// Make the context current on the calling thread
    fn bind(&self) -> Result<(), VideoError>;

    /// Release the context from the calling thread
    fn unbind(&self) -> Result<(), VideoError>;

    /// Framebuffer object the core renders into
    fn current_framebuffer(&self) -> usize;

    /// Address of a GL function, 0 if unknown
    fn proc_address(&self, symbol: &str) -> usize;

    /// Format used when reading pixels back
    fn set_pixel_format(&self, _format: PixelFormat) {}

    /// Reads the rendered frame back, `bytes` long, rows bottom-up
    fn read_framebuffer(&self, width: u32, height: u32, bytes: usize) -> Vec<u8>;

    /// Destroy the context
    fn deinit(&self) -> Result<(), VideoError>;
}

pub use null::NullContext;
