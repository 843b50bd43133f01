//! retrohost - libretro core host
//!
//! Runs one ROM with its configured core. Commands are read from stdin, the
//! session ends on `q` or when stdin closes.

use anyhow::{bail, Context};
use rh_core::{logging, Config};
use rh_integration::Frontend;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const USAGE: &str = "usage: retrohost <rom> [core]";

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load the config")?;
    logging::init(config.debug.log_level, config.emulator.libretro.log_level);

    tracing::info!("Starting retrohost");

    let mut args = std::env::args().skip(1);
    let Some(rom) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let core = match args.next() {
        Some(name) => name,
        None => config
            .emulator
            .core_for_rom(&rom)
            .with_context(|| format!("No core configured for {}", rom.display()))?
            .to_string(),
    };

    if config.emulator.metadata(&core)?.is_gl_allowed {
        bail!("Core {} renders with OpenGL, retrohost has no GL context to give it", core);
    }

    let frontend = Arc::new(Frontend::new(config.emulator.clone())?);
    frontend.set_session_id(&session_name(&rom));
    frontend.load_core(&core)?;
    frontend.load_game(&rom)?;

    let frames = Arc::new(AtomicU64::new(0));
    let counter = frames.clone();
    frontend.set_video_cb(move |_, _| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let runner = {
        let frontend = frontend.clone();
        std::thread::Builder::new()
            .name("runner".into())
            .spawn(move || frontend.start())?
    };

    for line in std::io::stdin().lock().lines() {
        let result = match line?.trim() {
            "q" | "quit" => break,
            "s" | "save" => frontend.save_game_state(),
            "l" | "load" => frontend.restore_game_state(),
            "m" | "multitap" => frontend.toggle_multitap(),
            "" => Ok(()),
            other => {
                tracing::warn!("Unknown command: {} (q, s, l, m)", other);
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::error!("{}", e);
        }
        if !frontend.is_running() {
            break;
        }
    }

    frontend.close()?;
    match runner.join() {
        Ok(result) => result?,
        Err(_) => bail!("Runner thread panicked"),
    }
    tracing::info!("Done after {} frames", frames.load(Ordering::Relaxed));
    Ok(())
}

/// Saves are keyed by the ROM name
fn session_name(rom: &Path) -> String {
    rom.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string())
}
