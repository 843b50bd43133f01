//! Configuration system for retrohost

use crate::error::{HostError, Result};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub emulator: EmulatorConfig,
    pub debug: DebugConfig,
}

/// Host settings shared by every core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Number of bands a frame is split into for conversion, 0 converts on the ticking thread
    pub threads: usize,
    /// Root for the core's system and save directories
    pub local_path: PathBuf,
    /// Where save states and SRAM dumps are written
    pub storage: PathBuf,
    /// Autosave period in seconds, 0 disables it
    pub autosave_sec: u64,
    /// Save on close if the session was saved before
    pub save_on_close: bool,
    pub scaling: ScaleFilter,
    pub aspect_ratio: AspectRatio,
    pub libretro: LibretroConfig,
}

/// Output aspect ratio settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AspectRatio {
    pub keep: bool,
    pub width: u32,
    pub height: u32,
}

/// Rescale filter used when a frame doesn't match the viewport
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum ScaleFilter {
    #[default]
    Nearest,
    Bilinear,
}

/// Libretro specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibretroConfig {
    /// Directory with core libraries
    pub libs: PathBuf,
    pub save_compression: bool,
    /// Log level applied to the messages cores print
    pub log_level: LogLevel,
    pub cores: BTreeMap<String, CoreConfig>,
}

/// Per-core settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Library file name without the platform extension
    pub lib: String,
    /// ROM file extensions handled by the core
    pub roms: Vec<String>,
    pub is_gl_allowed: bool,
    pub auto_gl_context: bool,
    pub uses_libco: bool,
    pub has_multitap: bool,
    pub vfr: bool,
    pub frame_dup: bool,
    pub core_aspect_ratio: bool,
    pub non_blocking_save: bool,
    pub scale: f64,
    pub hacks: Vec<String>,
    /// Port number to the list of devices plugged into it after game load
    pub hid: BTreeMap<String, Vec<u32>>,
    pub options: BTreeMap<String, String>,
    /// ROM name (without extension) to option overrides
    pub options4rom: BTreeMap<String, BTreeMap<String, String>>,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

// Default implementations

impl Default for EmulatorConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retrohost");

        Self {
            threads: 0,
            local_path: base.join("libretro"),
            storage: base.join("saves"),
            autosave_sec: 0,
            save_on_close: true,
            scaling: ScaleFilter::default(),
            aspect_ratio: AspectRatio::default(),
            libretro: LibretroConfig::default(),
        }
    }
}

impl Default for LibretroConfig {
    fn default() -> Self {
        let libs = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retrohost")
            .join("cores");

        let mut cores = BTreeMap::new();
        cores.insert(
            "nes".to_string(),
            CoreConfig::with_lib("nestopia_libretro", &["nes"]),
        );
        cores.insert(
            "snes".to_string(),
            CoreConfig {
                has_multitap: true,
                ..CoreConfig::with_lib("snes9x_libretro", &["smc", "sfc", "swc", "fig", "bs"])
            },
        );
        cores.insert(
            "gba".to_string(),
            CoreConfig::with_lib("mgba_libretro", &["gba", "gbc"]),
        );
        cores.insert(
            "pcsx".to_string(),
            CoreConfig {
                frame_dup: true,
                ..CoreConfig::with_lib("pcsx_rearmed_libretro", &["cue", "chd"])
            },
        );

        Self {
            libs,
            save_compression: true,
            log_level: LogLevel::Info,
            cores,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            lib: String::new(),
            roms: Vec::new(),
            is_gl_allowed: false,
            auto_gl_context: false,
            uses_libco: false,
            has_multitap: false,
            vfr: false,
            frame_dup: false,
            core_aspect_ratio: false,
            non_blocking_save: false,
            scale: 1.0,
            hacks: Vec::new(),
            hid: BTreeMap::new(),
            options: BTreeMap::new(),
            options4rom: BTreeMap::new(),
        }
    }
}

impl CoreConfig {
    fn with_lib(lib: &str, roms: &[&str]) -> Self {
        Self {
            lib: lib.to_string(),
            roms: roms.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl EmulatorConfig {
    /// Builds the immutable metadata passed to the host for a named core
    pub fn metadata(&self, core: &str) -> Result<Metadata> {
        let conf = self
            .libretro
            .cores
            .get(core)
            .ok_or_else(|| HostError::Config(format!("Unknown core: {}", core)))?;

        let mut hid = BTreeMap::new();
        for (port, devices) in &conf.hid {
            let port: u32 = port
                .trim()
                .parse()
                .map_err(|_| HostError::Config(format!("Bad hid port: {}", port)))?;
            hid.insert(port, devices.clone());
        }

        Ok(Metadata {
            lib_path: self.libretro.libs.join(&conf.lib),
            is_gl_allowed: conf.is_gl_allowed,
            auto_gl_context: conf.auto_gl_context,
            uses_libco: conf.uses_libco,
            has_multitap: conf.has_multitap,
            has_vfr: conf.vfr,
            frame_dup: conf.frame_dup,
            core_aspect_ratio: conf.core_aspect_ratio,
            non_blocking_save: conf.non_blocking_save,
            scale: if conf.scale > 1.0 { conf.scale } else { 1.0 },
            hacks: conf.hacks.clone(),
            hid,
            options: conf.options.clone(),
            options4rom: conf.options4rom.clone(),
        })
    }

    /// Finds the core that handles a ROM by its file extension
    pub fn core_for_rom(&self, rom: &Path) -> Option<&str> {
        let ext = rom.extension()?.to_str()?.to_ascii_lowercase();
        self.libretro
            .cores
            .iter()
            .find(|(_, c)| c.roms.iter().any(|r| r.eq_ignore_ascii_case(&ext)))
            .map(|(name, _)| name.as_str())
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, writing defaults if it's missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| HostError::Config(e.to_string()))
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| HostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("retrohost")
            .join("config.toml")
    }
}
