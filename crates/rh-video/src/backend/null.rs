//! Null context for headless runs and testing

use super::{ContextConfig, GraphicsContext};
use crate::format::PixelFormat;
use parking_lot::Mutex;
use rh_core::VideoError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Context without a GPU behind it.
///
/// Reads back black frames and counts how it is driven, which is enough to
/// run hardware-rendered cores that tolerate a missing GL.
#[derive(Default)]
pub struct NullContext {
    config: Mutex<Option<ContextConfig>>,
    format: Mutex<PixelFormat>,
    bound: AtomicBool,
    binds: AtomicU64,
    reads: AtomicU64,
}

impl NullContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<ContextConfig> {
        *self.config.lock()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    pub fn bind_count(&self) -> u64 {
        self.binds.load(Ordering::Relaxed)
    }

    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn pixel_format(&self) -> PixelFormat {
        *self.format.lock()
    }
}

impl GraphicsContext for NullContext {
    fn init(&self, config: &ContextConfig) -> Result<(), VideoError> {
        tracing::debug!("Null context init: {:?}", config);
        *self.config.lock() = Some(*config);
        Ok(())
    }

    fn bind(&self) -> Result<(), VideoError> {
        if self.config.lock().is_none() {
            return Err(VideoError::GraphicsContext("bind before init".into()));
        }
        self.bound.store(true, Ordering::Release);
        self.binds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn unbind(&self) -> Result<(), VideoError> {
        self.bound.store(false, Ordering::Release);
        Ok(())
    }

    fn current_framebuffer(&self) -> usize {
        0
    }

    fn proc_address(&self, _symbol: &str) -> usize {
        0
    }

    fn set_pixel_format(&self, format: PixelFormat) {
        *self.format.lock() = format;
    }

    fn read_framebuffer(&self, _width: u32, _height: u32, bytes: usize) -> Vec<u8> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        vec![0; bytes]
    }

    fn deinit(&self) -> Result<(), VideoError> {
        self.bound.store(false, Ordering::Release);
        *self.config.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ContextType;

    #[test]
    fn test_lifecycle() {
        let ctx = NullContext::new();
        assert!(ctx.bind().is_err());

        let config = ContextConfig {
            context: ContextType::from_raw(3),
            width: 640,
            height: 480,
            ..Default::default()
        };
        ctx.init(&config).unwrap();
        assert_eq!(ctx.config().map(|c| c.context), Some(ContextType::OpenGlCore));

        ctx.bind().unwrap();
        assert!(ctx.is_bound());
        ctx.unbind().unwrap();
        assert!(!ctx.is_bound());
        assert_eq!(ctx.bind_count(), 1);

        assert_eq!(ctx.read_framebuffer(2, 2, 16).len(), 16);
        ctx.deinit().unwrap();
        assert!(ctx.config().is_none());
    }
}
