//! Core library loading and entry point binding

use crate::abi::*;
use libloading::Library;
use rh_core::LoaderError;
use std::ffi::{c_uint, c_void};
use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
pub const LIB_EXT: &str = "dll";
#[cfg(target_os = "macos")]
pub const LIB_EXT: &str = "dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LIB_EXT: &str = "so";

/// Entry points of a libretro core
#[derive(Clone, Copy)]
pub struct CoreFns {
    pub init: unsafe extern "C" fn(),
    pub deinit: unsafe extern "C" fn(),
    pub api_version: Option<unsafe extern "C" fn() -> c_uint>,
    pub get_system_info: unsafe extern "C" fn(*mut retro_system_info),
    pub get_system_av_info: unsafe extern "C" fn(*mut retro_system_av_info),
    pub set_environment: unsafe extern "C" fn(retro_environment_t),
    pub set_video_refresh: unsafe extern "C" fn(retro_video_refresh_t),
    pub set_input_poll: unsafe extern "C" fn(retro_input_poll_t),
    pub set_input_state: unsafe extern "C" fn(retro_input_state_t),
    pub set_audio_sample: unsafe extern "C" fn(retro_audio_sample_t),
    pub set_audio_sample_batch: unsafe extern "C" fn(retro_audio_sample_batch_t),
    pub set_controller_port_device: Option<unsafe extern "C" fn(c_uint, c_uint)>,
    pub run: unsafe extern "C" fn(),
    pub serialize_size: Option<unsafe extern "C" fn() -> usize>,
    pub serialize: Option<unsafe extern "C" fn(*mut c_void, usize) -> bool>,
    pub unserialize: Option<unsafe extern "C" fn(*const c_void, usize) -> bool>,
    pub load_game: unsafe extern "C" fn(*const retro_game_info) -> bool,
    pub unload_game: unsafe extern "C" fn(),
    pub get_memory_data: Option<unsafe extern "C" fn(c_uint) -> *mut c_void>,
    pub get_memory_size: Option<unsafe extern "C" fn(c_uint) -> usize>,
}

impl CoreFns {
    /// Binds every entry point, failing on the first missing required one
    ///
    /// # Safety
    /// The library must be a libretro core, its symbols are trusted to
    /// have the libretro signatures.
    pub unsafe fn bind(lib: &Library) -> Result<Self, LoaderError> {
        unsafe fn required<T: Copy>(lib: &Library, name: &'static str) -> Result<T, LoaderError> {
            lib.get::<T>(name.as_bytes())
                .map(|s| *s)
                .map_err(|_| LoaderError::MissingSymbol(name))
        }
        unsafe fn optional<T: Copy>(lib: &Library, name: &'static str) -> Option<T> {
            match lib.get::<T>(name.as_bytes()) {
                Ok(s) => Some(*s),
                Err(_) => {
                    tracing::debug!("Optional symbol {} is missing", name);
                    None
                }
            }
        }

        Ok(Self {
            init: required(lib, "retro_init")?,
            deinit: required(lib, "retro_deinit")?,
            api_version: optional(lib, "retro_api_version"),
            get_system_info: required(lib, "retro_get_system_info")?,
            get_system_av_info: required(lib, "retro_get_system_av_info")?,
            set_environment: required(lib, "retro_set_environment")?,
            set_video_refresh: required(lib, "retro_set_video_refresh")?,
            set_input_poll: required(lib, "retro_set_input_poll")?,
            set_input_state: required(lib, "retro_set_input_state")?,
            set_audio_sample: required(lib, "retro_set_audio_sample")?,
            set_audio_sample_batch: required(lib, "retro_set_audio_sample_batch")?,
            set_controller_port_device: optional(lib, "retro_set_controller_port_device"),
            run: required(lib, "retro_run")?,
            serialize_size: optional(lib, "retro_serialize_size"),
            serialize: optional(lib, "retro_serialize"),
            unserialize: optional(lib, "retro_unserialize"),
            load_game: required(lib, "retro_load_game")?,
            unload_game: required(lib, "retro_unload_game")?,
            get_memory_data: optional(lib, "retro_get_memory_data"),
            get_memory_size: optional(lib, "retro_get_memory_size"),
        })
    }

    /// Save states need all three serialization entry points
    pub fn has_savestates(&self) -> bool {
        self.serialize_size.is_some() && self.serialize.is_some() && self.unserialize.is_some()
    }
}

/// Finds the library file for a core path.
///
/// First the exact name (with the platform extension), then every file in
/// the same directory whose name starts with it, in name order.
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    path: PathBuf,
}

impl LibraryResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path with the platform extension
    pub fn exact(&self) -> PathBuf {
        let has_ext = self
            .path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(LIB_EXT));
        if has_ext {
            self.path.clone()
        } else {
            let mut s = self.path.clone().into_os_string();
            s.push(".");
            s.push(LIB_EXT);
            PathBuf::from(s)
        }
    }

    /// Ordered fallback list for the prefix scan
    pub fn candidates(&self) -> Vec<PathBuf> {
        let exact = self.exact();
        let (Some(dir), Some(prefix)) = (exact.parent(), exact.file_name()) else {
            return Vec::new();
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let prefix = prefix.to_string_lossy().into_owned();

        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .filter(|p| *p != exact)
            .collect();
        found.sort();
        found
    }

    pub fn resolve(&self) -> Result<(Library, PathBuf), LoaderError> {
        let exact = self.exact();
        match open_library(&exact) {
            Ok(lib) => return Ok((lib, exact)),
            Err(e) => tracing::warn!("Load fail: {}, {}", exact.display(), e),
        }

        if exact != self.path {
            if let Ok(lib) = open_library(&self.path) {
                return Ok((lib, self.path.clone()));
            }
        }

        for candidate in self.candidates() {
            match open_library(&candidate) {
                Ok(lib) => {
                    tracing::info!("Loaded fallback core library {}", candidate.display());
                    return Ok((lib, candidate));
                }
                Err(e) => tracing::debug!("Skip {}: {}", candidate.display(), e),
            }
        }

        Err(LoaderError::NotFound(exact))
    }
}

fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    #[cfg(unix)]
    {
        use libloading::os::unix::{self, RTLD_LOCAL, RTLD_NOW};
        // SAFETY: loading a core runs its initializers, the caller trusts it
        unsafe { unix::Library::open(Some(path), RTLD_NOW | RTLD_LOCAL).map(Library::from) }
    }
    #[cfg(not(unix))]
    {
        // SAFETY: as above
        unsafe { Library::new(path) }
    }
}

/// A loaded core: the library (absent for linked-in cores) plus its entry points
pub struct CoreHandle {
    lib: Option<Library>,
    fns: CoreFns,
    path: PathBuf,
}

impl CoreHandle {
    /// Resolves and opens a core library, then binds its entry points
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoaderError> {
        let (lib, path) = LibraryResolver::new(path).resolve()?;
        // SAFETY: the file was resolved as a core library
        let fns = unsafe { CoreFns::bind(&lib)? };
        tracing::info!("Core library {} loaded", path.display());
        Ok(Self {
            lib: Some(lib),
            fns,
            path,
        })
    }

    /// Wraps a core linked into the process
    pub fn from_fns(fns: CoreFns) -> Self {
        Self {
            lib: None,
            fns,
            path: PathBuf::new(),
        }
    }

    pub fn fns(&self) -> &CoreFns {
        &self.fns
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dynamic(&self) -> bool {
        self.lib.is_some()
    }

    /// Unloads the library. Must only run after the core is deinitialized.
    pub fn close(mut self) -> Result<(), LoaderError> {
        match self.lib.take() {
            Some(lib) => lib.close().map_err(|e| LoaderError::Close(e.to_string())),
            None => Ok(()),
        }
    }
}
