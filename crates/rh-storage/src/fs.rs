//! Plain file storage

use crate::Storage;
use parking_lot::RwLock;
use rh_core::StorageError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub const STATE_EXT: &str = "dat";
pub const SRAM_EXT: &str = "srm";

/// Writes saves as `<path>/<session>.dat` and `<path>/<session>.srm`
pub struct StateStorage {
    path: PathBuf,
    main_save: RwLock<String>,
    non_blocking: AtomicBool,
}

impl StateStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            main_save: RwLock::new(String::new()),
            non_blocking: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.path
    }

    fn file(&self, ext: &str) -> PathBuf {
        self.path.join(format!("{}.{}", self.main_save.read(), ext))
    }
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)
}

impl Storage for StateStorage {
    fn save_path(&self) -> PathBuf {
        self.file(STATE_EXT)
    }

    fn sram_path(&self) -> PathBuf {
        self.file(SRAM_EXT)
    }

    fn set_main_save_name(&self, name: &str) {
        *self.main_save.write() = name.to_string();
    }

    fn set_non_blocking(&self, non_blocking: bool) {
        self.non_blocking.store(non_blocking, Ordering::Relaxed);
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
            _ => StorageError::Io(e),
        })
    }

    fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if self.non_blocking.load(Ordering::Relaxed) {
            let path = path.to_path_buf();
            let data = data.to_vec();
            std::thread::Builder::new()
                .name("save-writer".into())
                .spawn(move || {
                    if let Err(e) = write_file(&path, &data) {
                        tracing::error!("Background save to {} failed: {}", path.display(), e);
                    }
                })?;
            return Ok(());
        }

        write_file(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let store = StateStorage::new("/saves");
        store.set_main_save_name("room42");
        assert_eq!(store.save_path(), PathBuf::from("/saves/room42.dat"));
        assert_eq!(store.sram_path(), PathBuf::from("/saves/room42.srm"));
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStorage::new(dir.path().join("nested"));
        store.set_main_save_name("game");

        let path = store.save_path();
        store.save(&path, b"state").unwrap();
        assert_eq!(store.load(&path).unwrap(), b"state");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStorage::new(dir.path());
        let err = store.load(&store.sram_path()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_blocking_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStorage::new(dir.path());
        store.set_main_save_name("bg");
        store.set_non_blocking(true);

        let path = store.save_path();
        store.save(&path, &[1, 2, 3]).unwrap();

        let mut data = Vec::new();
        for _ in 0..200 {
            if let Ok(d) = store.load(&path) {
                if d.len() == 3 {
                    data = d;
                    break;
                }
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(data, vec![1, 2, 3]);
    }
}
