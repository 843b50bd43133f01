//! Per-port controller state
//!
//! Every field is an independent atomic so remote producers can write
//! while the core polls from inside a tick without either side waiting.

use crate::keyboard::KeyboardState;
use crate::mouse::MouseState;
use std::sync::atomic::{AtomicI16, AtomicU32, Ordering};

/// Number of controller ports
pub const MAX_PORT: usize = 4;
/// Number of analog axes per port
pub const DPAD_AXES: usize = 4;

/// One controller port
#[derive(Debug, Default)]
pub struct PortState {
    keys: AtomicU32,
    axes: [AtomicI16; DPAD_AXES],
}

/// Controller state of every port, plus the shared keyboard and mouse
#[derive(Debug, Default)]
pub struct InputState {
    ports: [PortState; MAX_PORT],
    keyboard: KeyboardState,
    mouse: MouseState,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a controller payload.
    ///
    /// Bytes 0..2 are the little-endian button mask, each following
    /// little-endian pair is one axis. Missing axes keep their old value.
    pub fn set_input(&self, port: usize, data: &[u8]) {
        let Some(state) = self.ports.get(port) else {
            tracing::debug!("Input for unknown port {}", port);
            return;
        };
        if data.len() < 2 {
            return;
        }

        let keys = u16::from_le_bytes([data[0], data[1]]);
        state.keys.store(keys as u32, Ordering::Release);

        for (i, axis) in state.axes.iter().enumerate() {
            let at = 2 + (i << 1);
            if at + 1 >= data.len() {
                break;
            }
            axis.store(i16::from_le_bytes([data[at], data[at + 1]]), Ordering::Release);
        }
    }

    pub fn is_key_pressed(&self, port: usize, key: u32) -> bool {
        match self.ports.get(port) {
            Some(state) if key < 32 => (state.keys.load(Ordering::Acquire) >> key) & 1 == 1,
            _ => false,
        }
    }

    /// Axis value, 0 for unknown ports or axes
    pub fn axis(&self, port: usize, axis: usize) -> i16 {
        self.ports
            .get(port)
            .and_then(|s| s.axes.get(axis))
            .map_or(0, |a| a.load(Ordering::Acquire))
    }

    pub fn keys(&self, port: usize) -> u32 {
        self.ports
            .get(port)
            .map_or(0, |s| s.keys.load(Ordering::Acquire))
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Releases everything
    pub fn clear(&self) {
        self.keyboard.clear();
        self.mouse.clear();
        for state in &self.ports {
            state.keys.store(0, Ordering::Release);
            for axis in &state.axes {
                axis.store(0, Ordering::Release);
            }
        }
    }
}
