//! Frame pipeline for retrohost
//!
//! Raw frames from a core are converted to RGBA, rotated, optionally
//! rescaled to the viewport, and handed out as pooled [`Frame`]s.

pub mod backend;
pub mod canvas;
pub mod format;
pub mod frame;
pub mod pool;
pub mod rotation;
pub mod scale;

pub use backend::{ContextConfig, ContextType, GraphicsContext, NullContext};
pub use canvas::Canvas;
pub use format::PixelFormat;
pub use frame::{Frame, FrameInfo};
pub use pool::FramePool;
pub use rotation::{Rotation, Transform};
