//! Core types for the retrohost libretro host
//!
//! This crate provides the foundational types, error handling,
//! configuration, frame timing, and logging infrastructure shared by
//! the host crates.

pub mod av;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod scheduler;

pub use av::{AvInfo, Geometry, SystemInfo, Timing};
pub use config::{AspectRatio, Config, CoreConfig, EmulatorConfig, LogLevel, ScaleFilter};
pub use error::{
    CoreError, HostError, LoaderError, NegotiationError, Result, StorageError, VideoError,
};
pub use metadata::{Metadata, HACK_SKIP_HW_CONTEXT_DESTROY};
pub use scheduler::{tick_interval, FrameClock};
