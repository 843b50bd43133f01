//! Audio output of a running core

pub mod relay;

pub use relay::{estimate_duration, AudioChunk, AudioRelay};
