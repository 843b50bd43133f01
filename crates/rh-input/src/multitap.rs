//! Multitap adapter plugged into port 1

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::device::DEVICE_JOYPAD;

/// Port the multitap adapter goes into
pub const MULTITAP_PORT: u32 = 1;

/// Remembers the multitap device id a core advertised and whether it's plugged
#[derive(Debug, Default)]
pub struct Multitap {
    supported: AtomicBool,
    device: AtomicU32,
    enabled: AtomicBool,
}

impl Multitap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::Release);
    }

    pub fn is_supported(&self) -> bool {
        self.supported.load(Ordering::Acquire)
    }

    /// Caches the id found in the core's controller info
    pub fn set_device(&self, id: u32) {
        self.device.store(id, Ordering::Release);
    }

    pub fn device(&self) -> u32 {
        self.device.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flips the adapter state and returns the `(port, device)` pair to apply,
    /// or `None` when the core has no multitap.
    pub fn toggle(&self) -> Option<(u32, u32)> {
        let device = self.device();
        if !self.is_supported() || device == 0 {
            return None;
        }
        let was = self.enabled.fetch_xor(true, Ordering::AcqRel);
        let next = if was { DEVICE_JOYPAD } else { device };
        tracing::debug!("Multitap {}", if was { "off" } else { "on" });
        Some((MULTITAP_PORT, next))
    }

    pub fn reset(&self) {
        self.supported.store(false, Ordering::Release);
        self.device.store(0, Ordering::Release);
        self.enabled.store(false, Ordering::Release);
    }
}
