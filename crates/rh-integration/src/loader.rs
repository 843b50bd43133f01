//! Game loader: prepares the game record passed to `retro_load_game`
//!
//! Cores that declare `need_fullpath` open the ROM themselves and only get
//! its path and size. Everyone else gets the whole file in memory.

use rh_core::{CoreError, Result};
use rh_ffi::abi::retro_game_info;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A ROM ready to hand to a core
#[derive(Debug)]
pub struct LoadedGame {
    /// Original file path
    path: PathBuf,
    /// Same path as a C string, alive as long as the game
    c_path: CString,
    /// File contents, `None` for cores that read the file themselves
    data: Option<Vec<u8>>,
    /// File size in bytes
    size: usize,
}

impl LoadedGame {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_in_memory(&self) -> bool {
        self.data.is_some()
    }

    /// Borrowed view for the core; valid while `self` is
    pub fn info(&self) -> retro_game_info {
        retro_game_info {
            path: self.c_path.as_ptr(),
            data: self
                .data
                .as_ref()
                .map_or(std::ptr::null(), |d| d.as_ptr().cast()),
            size: self.size,
            meta: std::ptr::null(),
        }
    }
}

pub struct GameLoader;

impl GameLoader {
    /// Reads (or just stats) a ROM file
    pub fn load<P: AsRef<Path>>(path: P, need_fullpath: bool) -> Result<LoadedGame> {
        let path = path.as_ref();
        info!("Loading game: {}", path.display());

        let c_path = CString::new(path.to_string_lossy().as_bytes())
            .map_err(|_| CoreError::LoadGameFailed(path.to_path_buf()))?;

        let (data, size) = if need_fullpath {
            let size = std::fs::metadata(path)?.len() as usize;
            debug!("Core reads the ROM itself ({} bytes)", size);
            (None, size)
        } else {
            let data = std::fs::read(path)?;
            let size = data.len();
            (Some(data), size)
        };

        Ok(LoadedGame {
            path: path.to_path_buf(),
            c_path,
            data,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rh_core::HostError;

    #[test]
    fn test_load_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let rom = dir.path().join("game.nes");
        std::fs::write(&rom, [1u8, 2, 3, 4]).unwrap();

        let game = GameLoader::load(&rom, false).unwrap();
        assert!(game.is_in_memory());
        let info = game.info();
        assert_eq!(info.size, 4);
        assert!(!info.data.is_null());
        let bytes = unsafe { std::slice::from_raw_parts(info.data as *const u8, info.size) };
        assert_eq!(bytes, &[1, 2, 3, 4]);
        assert_eq!(
            unsafe { rh_ffi::abi::c_str(info.path) },
            rom.to_string_lossy()
        );
    }

    #[test]
    fn test_load_fullpath() {
        let dir = tempfile::tempdir().unwrap();
        let rom = dir.path().join("game.z64");
        std::fs::write(&rom, vec![0u8; 1024]).unwrap();

        let game = GameLoader::load(&rom, true).unwrap();
        assert!(!game.is_in_memory());
        assert!(game.info().data.is_null());
        assert_eq!(game.size(), 1024);
    }

    #[test]
    fn test_missing_rom() {
        let err = GameLoader::load("/nonexistent/rom.bin", false).unwrap_err();
        assert!(matches!(err, HostError::Io(_)));
    }
}
