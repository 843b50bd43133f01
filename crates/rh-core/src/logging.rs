//! Logging setup

use crate::config::LogLevel;
use tracing_subscriber::EnvFilter;

impl LogLevel {
    /// Directive understood by `EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over the configured
/// levels; `core` applies to what loaded cores print. Calling it twice is
/// harmless.
pub fn init(level: LogLevel, core: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},core={}", level.as_directive(), core.as_directive()))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init();
}

/// Formats a byte count as `1.5 KiB`
pub fn byte_count_binary(b: u64) -> String {
    const UNIT: u64 = 1024;
    if b < UNIT {
        return format!("{} B", b);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = b / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let suffix = b"KMGTPE"[exp] as char;
    format!("{:.1} {}iB", b as f64 / div as f64, suffix)
}
