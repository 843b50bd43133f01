//! Compressing decorator over any storage
//!
//! Each file is a zip archive holding one deflated entry named after the
//! file without the archive extension.

use crate::Storage;
use rh_core::StorageError;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const EXT: &str = ".zip";

pub struct CompressedStorage<S> {
    inner: S,
}

impl<S: Storage> CompressedStorage<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn with_ext(path: PathBuf) -> PathBuf {
    let mut s = path.into_os_string();
    s.push(EXT);
    PathBuf::from(s)
}

fn archive_err(e: zip::result::ZipError) -> StorageError {
    StorageError::Archive(e.to_string())
}

/// Packs `data` as an archive entry called `name`
pub fn compress(data: &[u8], name: &str) -> Result<Vec<u8>, StorageError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(data.len() / 2)));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(name, options).map_err(archive_err)?;
    writer.write_all(data)?;
    Ok(writer.finish().map_err(archive_err)?.into_inner())
}

/// Unpacks an archive, returning the first entry's data and name
pub fn decompress(data: &[u8]) -> Result<(Vec<u8>, String), StorageError> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(archive_err)?;
    if archive.is_empty() {
        return Err(StorageError::Archive("no entries".into()));
    }
    let mut entry = archive.by_index(0).map_err(archive_err)?;
    let name = entry.name().to_string();
    let mut out = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut out)?;
    Ok((out, name))
}

impl<S: Storage> Storage for CompressedStorage<S> {
    fn save_path(&self) -> PathBuf {
        with_ext(self.inner.save_path())
    }

    fn sram_path(&self) -> PathBuf {
        with_ext(self.inner.sram_path())
    }

    fn set_main_save_name(&self, name: &str) {
        self.inner.set_main_save_name(name);
    }

    fn set_non_blocking(&self, non_blocking: bool) {
        self.inner.set_non_blocking(non_blocking);
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        let data = self.inner.load(path)?;
        let (out, _) = decompress(&data)?;
        Ok(out)
    }

    fn save(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = name.strip_suffix(EXT).unwrap_or(&name);
        if name.is_empty() || name == "." {
            return Err(StorageError::InvalidName);
        }
        let packed = compress(data, name)?;
        self.inner.save(path, &packed)
    }
}
