//! Error types for the retrohost core host

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the host
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Host is already in use by another frontend")]
    HostBusy,
}

impl HostError {
    /// Fatal errors end the life of the loaded core; the rest are returned
    /// to the caller who may retry or skip.
    pub fn is_fatal(&self) -> bool {
        match self {
            HostError::Loader(_) | HostError::Negotiation(_) | HostError::HostBusy => true,
            HostError::Core(e) => e.is_fatal(),
            HostError::Video(VideoError::GraphicsContext(_) | VideoError::UnsupportedPixelFormat(_)) => true,
            _ => false,
        }
    }
}

/// Shared library resolution and symbol binding errors
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Core library not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Couldn't open {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Missing required symbol: {0}")]
    MissingSymbol(&'static str),

    #[error("Couldn't close the core library: {0}")]
    Close(String),
}

/// Failures of the environment protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("Unknown pixel format: {0}")]
    UnknownPixelFormat(u32),

    #[error("Hardware render context requested but no graphics context is available")]
    NoGraphicsContext,
}

/// Errors reported by or about the loaded core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No core is loaded")]
    NotLoaded,

    #[error("A core is already loaded, shut it down first")]
    AlreadyLoaded,

    #[error("No game is loaded")]
    NoGame,

    #[error("Core failed to load ROM: {}", .0.display())]
    LoadGameFailed(PathBuf),

    #[error("retro_serialize failed")]
    SerializeFailed,

    #[error("retro_unserialize failed")]
    UnserializeFailed,

    #[error("Core doesn't support {0}")]
    Unsupported(&'static str),

    #[error("Call thread is gone")]
    CallThreadGone,
}

impl CoreError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::LoadGameFailed(_) | CoreError::CallThreadGone)
    }
}

/// Frame pipeline errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(&'static str),

    #[error("Frame buffer too small: {got} bytes, expected {expected}")]
    ShortBuffer { got: usize, expected: usize },

    #[error("Empty frame: {0}x{1}")]
    EmptyFrame(u32, u32),

    #[error("Graphics context error: {0}")]
    GraphicsContext(String),
}

/// Save state storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid archive entry name")]
    InvalidName,

    #[error("Bad archive: {0}")]
    Archive(String),

    #[error("Save not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            StorageError::InvalidName | StorageError::Archive(_) => false,
        }
    }
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;
