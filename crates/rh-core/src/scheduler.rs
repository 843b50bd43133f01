//! Frame timing
//!
//! The tick interval comes from the core's declared fps. Cores with a
//! variable frame rate get the measured time between two refresh callbacks
//! attached to each frame instead.

use std::time::{Duration, Instant};

const FALLBACK_FPS: f64 = 60.0;

/// Fixed interval between ticks for a frame rate
pub fn tick_interval(fps: f64) -> Duration {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        FALLBACK_FPS
    };
    Duration::from_secs_f64(1.0 / fps)
}

/// Tracks frame durations for the refresh callback
#[derive(Debug, Clone)]
pub struct FrameClock {
    tick: Duration,
    vfr: bool,
    last: Instant,
}

impl FrameClock {
    pub fn new(fps: f64, vfr: bool) -> Self {
        Self {
            tick: tick_interval(fps),
            vfr,
            last: Instant::now(),
        }
    }

    pub fn tick_time(&self) -> Duration {
        self.tick
    }

    pub fn is_vfr(&self) -> bool {
        self.vfr
    }

    /// Restarts measuring from `now`, used when the loop (re)starts
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Duration of the frame delivered at `now`
    pub fn frame_duration(&mut self, now: Instant) -> Duration {
        let dt = if self.vfr {
            now.saturating_duration_since(self.last)
        } else {
            self.tick
        };
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FALLBACK_FPS, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval(50.0), Duration::from_millis(20));
        assert_eq!(tick_interval(0.0), tick_interval(60.0));
        assert_eq!(tick_interval(f64::NAN), tick_interval(60.0));
    }

    #[test]
    fn test_fixed_duration() {
        let mut clock = FrameClock::new(50.0, false);
        let start = Instant::now();
        clock.reset(start);
        let dt = clock.frame_duration(start + Duration::from_millis(35));
        assert_eq!(dt, Duration::from_millis(20));
    }

    #[test]
    fn test_vfr_duration() {
        let mut clock = FrameClock::new(60.0, true);
        let start = Instant::now();
        clock.reset(start);
        assert_eq!(
            clock.frame_duration(start + Duration::from_millis(10)),
            Duration::from_millis(10)
        );
        assert_eq!(
            clock.frame_duration(start + Duration::from_millis(33)),
            Duration::from_millis(23)
        );
    }
}
