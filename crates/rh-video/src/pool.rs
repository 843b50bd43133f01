//! Fixed-capacity frame pool

use crate::frame::Frame;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, Ordering};

/// Recycles frame buffers sized for the core's maximum resolution
pub struct FramePool {
    free: ArrayQueue<Frame>,
    max_pixels: usize,
    enabled: AtomicBool,
}

impl FramePool {
    pub fn new(slots: usize, max_pixels: usize) -> Self {
        Self {
            free: ArrayQueue::new(slots.max(1)),
            max_pixels,
            enabled: AtomicBool::new(true),
        }
    }

    /// A frame reshaped to `width`x`height`; contents are unspecified
    pub fn get(&self, width: usize, height: usize) -> Frame {
        let mut frame = self
            .free
            .pop()
            .unwrap_or_else(|| Frame::with_capacity(self.max_pixels.max(width * height)));
        frame.reshape(width, height);
        frame
    }

    /// Hands a frame back; dropped when the pool is full or disabled
    pub fn put(&self, frame: Frame) {
        if self.enabled.load(Ordering::Relaxed) {
            let _ = self.free.push(frame);
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            while self.free.pop().is_some() {}
        }
    }

    pub fn max_pixels(&self) -> usize {
        self.max_pixels
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse() {
        let pool = FramePool::new(2, 64);
        let f = pool.get(4, 4);
        assert!(f.capacity_pixels() >= 64);
        pool.put(f);
        assert_eq!(pool.available(), 1);
        let f = pool.get(8, 8);
        assert_eq!(f.pixels().len(), 256);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_full_pool_drops() {
        let pool = FramePool::new(1, 4);
        pool.put(pool.get(1, 1));
        pool.put(Frame::new(1, 1));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_disabled() {
        let pool = FramePool::new(2, 4);
        pool.put(pool.get(1, 1));
        pool.set_enabled(false);
        assert_eq!(pool.available(), 0);
        pool.put(pool.get(1, 1));
        assert_eq!(pool.available(), 0);
    }
}
