//! Relays core PCM to a downstream consumer
//!
//! Cores push either single stereo frames or interleaved batches. Both end
//! up as one [`AudioChunk`] on a bounded channel. A slow consumer loses
//! chunks; the tick never waits for it.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Interleaved stereo samples plus their playback time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub samples: Vec<i16>,
    pub duration: Duration,
}

/// Playback time of `samples` interleaved stereo samples
pub fn estimate_duration(samples: usize, sample_rate: f64) -> Duration {
    if sample_rate <= 0.0 || !sample_rate.is_finite() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(samples as f64 / (sample_rate * 2.0))
}

pub struct AudioRelay {
    tx: RwLock<Option<Sender<AudioChunk>>>,
    sample_rate: AtomicU64,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl AudioRelay {
    pub fn new() -> Self {
        Self {
            tx: RwLock::new(None),
            sample_rate: AtomicU64::new(0f64.to_bits()),
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn set_sample_rate(&self, rate: f64) {
        self.sample_rate.store(rate.to_bits(), Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> f64 {
        f64::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }

    /// Replaces the consumer, chunks go to the returned receiver from now on
    pub fn subscribe(&self, capacity: usize) -> Receiver<AudioChunk> {
        let (tx, rx) = bounded(capacity.max(1));
        *self.tx.write() = Some(tx);
        rx
    }

    pub fn unsubscribe(&self) {
        *self.tx.write() = None;
    }

    /// One stereo frame
    pub fn push_sample(&self, left: i16, right: i16) {
        self.push_batch(&[left, right]);
    }

    /// Interleaved stereo samples, returns the number of frames consumed
    pub fn push_batch(&self, samples: &[i16]) -> usize {
        let frames = samples.len() >> 1;
        let tx = self.tx.read();
        let Some(tx) = tx.as_ref() else {
            return frames;
        };

        let chunk = AudioChunk {
            samples: samples.to_vec(),
            duration: estimate_duration(samples.len(), self.sample_rate()),
        };
        match tx.try_send(chunk) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::trace!("Audio chunk dropped ({} so far)", n);
            }
        }
        frames
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for AudioRelay {
    fn default() -> Self {
        Self::new()
    }
}
