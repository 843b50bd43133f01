//! Execution engine and frontend for retrohost
//!
//! This crate drives a loaded core: game loading, ticking, save states and
//! the frame and audio outputs.

pub mod engine;
pub mod frontend;
pub mod loader;
mod runner;

pub use engine::{Engine, ExecutionModel};
pub use frontend::{viewport_calc, Frontend, VideoCallback};
pub use loader::{GameLoader, LoadedGame};
