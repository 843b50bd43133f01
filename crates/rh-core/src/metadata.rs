//! Immutable per-core description handed to the host at load time

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Skips `context_destroy` on shutdown for cores that crash inside it
pub const HACK_SKIP_HW_CONTEXT_DESTROY: &str = "skip_hw_context_destroy";

/// Everything the host needs to know about a core before loading it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Library path without the platform extension
    pub lib_path: PathBuf,
    /// Honor hardware render requests
    pub is_gl_allowed: bool,
    /// Let the graphics provider pick the context version
    pub auto_gl_context: bool,
    /// The core switches stacks internally and needs a fixed calling thread
    pub uses_libco: bool,
    pub has_multitap: bool,
    /// Frame durations follow the refresh callback instead of a fixed tick
    pub has_vfr: bool,
    /// Re-emit the previous frame when the core reports a duplicate
    pub frame_dup: bool,
    /// Recompute the viewport when the core changes its geometry
    pub core_aspect_ratio: bool,
    pub non_blocking_save: bool,
    pub scale: f64,
    pub hacks: Vec<String>,
    /// Port to devices set after the game is loaded
    pub hid: BTreeMap<u32, Vec<u32>>,
    pub options: BTreeMap<String, String>,
    pub options4rom: BTreeMap<String, BTreeMap<String, String>>,
}

impl Metadata {
    pub fn has_hack(&self, hack: &str) -> bool {
        self.hacks.iter().any(|h| h == hack)
    }

    /// Core options with the overrides of a particular ROM applied on top
    pub fn options_for_rom(&self, rom: &Path) -> BTreeMap<String, String> {
        let mut options = self.options.clone();
        let name = rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(overrides) = self.options4rom.get(&name) {
            for (k, v) in overrides {
                tracing::debug!("Replace: {}={}", k, v);
                options.insert(k.clone(), v.clone());
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_hack() {
        let meta = Metadata {
            hacks: vec![HACK_SKIP_HW_CONTEXT_DESTROY.to_string()],
            ..Default::default()
        };
        assert!(meta.has_hack(HACK_SKIP_HW_CONTEXT_DESTROY));
        assert!(!meta.has_hack("other"));
    }

    #[test]
    fn test_options_for_rom() {
        let mut meta = Metadata::default();
        meta.options.insert("a".into(), "1".into());
        meta.options.insert("b".into(), "2".into());
        let mut over = BTreeMap::new();
        over.insert("b".to_string(), "3".to_string());
        meta.options4rom.insert("Game".into(), over);

        let opts = meta.options_for_rom(Path::new("/roms/Game.bin"));
        assert_eq!(opts["a"], "1");
        assert_eq!(opts["b"], "3");

        let opts = meta.options_for_rom(Path::new("/roms/Other.bin"));
        assert_eq!(opts["b"], "2");
    }
}
