//! Save state storage for retrohost
//!
//! Save states and SRAM dumps are opaque blobs. They are written under a
//! per-session name, either as raw files ([`StateStorage`]) or wrapped by
//! [`CompressedStorage`].

pub mod compressed;
pub mod fs;
pub mod hash;

use rh_core::StorageError;
use std::path::{Path, PathBuf};

pub use compressed::CompressedStorage;
pub use fs::StateStorage;
pub use hash::state_hash;

/// Where and how save data is kept
pub trait Storage: Send + Sync {
    /// Path of the main save state for the current session
    fn save_path(&self) -> PathBuf;

    /// Path of the SRAM dump for the current session
    fn sram_path(&self) -> PathBuf;

    /// Names the session, saves are keyed by it
    fn set_main_save_name(&self, name: &str);

    /// Write in the background and return right away
    fn set_non_blocking(&self, non_blocking: bool);

    fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save_path(&self) -> PathBuf {
        (**self).save_path()
    }

    fn sram_path(&self) -> PathBuf {
        (**self).sram_path()
    }

    fn set_main_save_name(&self, name: &str) {
        (**self).set_main_save_name(name)
    }

    fn set_non_blocking(&self, non_blocking: bool) {
        (**self).set_non_blocking(non_blocking)
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        (**self).load(path)
    }

    fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        (**self).save(path, data)
    }
}

/// Picks the storage flavor from the host settings
pub fn open(path: impl Into<PathBuf>, compress: bool) -> Box<dyn Storage> {
    let store = StateStorage::new(path);
    if compress {
        Box::new(CompressedStorage::new(store))
    } else {
        Box::new(store)
    }
}
