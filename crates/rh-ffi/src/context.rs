//! Process-wide host state behind the core callbacks
//!
//! The libretro ABI passes no user data to callbacks, so everything a
//! callback touches lives in [`HOST`]. Only one frontend may own it at a
//! time, see [`HostContext::reserve`]. Locks here are never held across a
//! call into the core.

use crate::environment::Environment;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use rh_audio::AudioRelay;
use rh_core::{FrameClock, HostError};
use rh_input::InputState;
use rh_video::{FrameInfo, GraphicsContext, PixelFormat, Transform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub static HOST: Lazy<HostContext> = Lazy::new(HostContext::new);

/// Pixels of one refresh callback
#[derive(Debug, Clone, Copy)]
pub enum RawFrame<'a> {
    /// The core asked to show the previous frame again
    Dup,
    Data { bytes: &'a [u8], info: FrameInfo },
}

/// A video refresh as seen by the frontend
#[derive(Debug, Clone, Copy)]
pub struct VideoRefresh<'a> {
    pub frame: RawFrame<'a>,
    pub format: PixelFormat,
    pub transform: Transform,
    pub duration: Duration,
}

pub type VideoSink = Box<dyn Fn(VideoRefresh<'_>) + Send + Sync>;

pub struct HostContext {
    reserved: AtomicBool,
    stopped: AtomicBool,
    pub env: Mutex<Environment>,
    pub input: InputState,
    pub audio: AudioRelay,
    video: RwLock<Option<VideoSink>>,
    clock: Mutex<FrameClock>,
    graphics: RwLock<Option<Arc<dyn GraphicsContext>>>,
}

/// Exclusive ownership of [`HOST`]; released on drop
#[derive(Debug)]
pub struct HostReservation {
    _private: (),
}

impl Drop for HostReservation {
    fn drop(&mut self) {
        HOST.clear();
        HOST.reserved.store(false, Ordering::Release);
        tracing::debug!("Host released");
    }
}

impl HostContext {
    fn new() -> Self {
        Self {
            reserved: AtomicBool::new(false),
            stopped: AtomicBool::new(true),
            env: Mutex::new(Environment::new()),
            input: InputState::new(),
            audio: AudioRelay::new(),
            video: RwLock::new(None),
            clock: Mutex::new(FrameClock::default()),
            graphics: RwLock::new(None),
        }
    }

    /// Claims the host for one frontend. A second claim fails until the
    /// first reservation is dropped.
    pub fn reserve(&self) -> Result<HostReservation, HostError> {
        self.reserved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HostError::HostBusy)?;
        Ok(HostReservation { _private: () })
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved.load(Ordering::Acquire)
    }

    /// Stopped hosts ignore video and audio from the core
    pub fn set_stopped(&self, stopped: bool) {
        self.stopped.store(stopped, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn set_video_sink(&self, sink: Option<VideoSink>) {
        *self.video.write() = sink;
    }

    pub fn set_clock(&self, clock: FrameClock) {
        *self.clock.lock() = clock;
    }

    pub fn reset_clock(&self) {
        self.clock.lock().reset(Instant::now());
    }

    pub fn tick_time(&self) -> Duration {
        self.clock.lock().tick_time()
    }

    pub fn set_graphics(&self, graphics: Option<Arc<dyn GraphicsContext>>) {
        *self.graphics.write() = graphics;
    }

    pub fn graphics(&self) -> Option<Arc<dyn GraphicsContext>> {
        self.graphics.read().clone()
    }

    pub(crate) fn frame_duration(&self) -> Duration {
        self.clock.lock().frame_duration(Instant::now())
    }

    pub(crate) fn with_video_sink(&self, f: impl FnOnce(&VideoSink)) {
        if let Some(sink) = self.video.read().as_ref() {
            f(sink);
        }
    }

    /// Drops everything a previous core left behind
    pub fn clear(&self) {
        self.set_stopped(true);
        self.env.lock().reset();
        self.input.clear();
        self.audio.unsubscribe();
        self.set_video_sink(None);
        self.set_clock(FrameClock::default());
        self.set_graphics(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reservation() {
        let _guard = crate::TEST_LOCK.lock();
        let first = HOST.reserve().unwrap();
        assert!(HOST.is_reserved());
        assert!(matches!(HOST.reserve(), Err(HostError::HostBusy)));

        HOST.input.set_input(0, &[1, 0]);
        drop(first);
        assert!(!HOST.is_reserved());
        assert_eq!(HOST.input.keys(0), 0);
        assert!(HOST.is_stopped());

        let again = HOST.reserve();
        assert!(again.is_ok());
    }
}
