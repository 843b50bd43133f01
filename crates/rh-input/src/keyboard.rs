//! Keyboard state
//!
//! Remote clients send one event per key change:
//!
//! ```text
//! 0 1 2 3 4 5 6
//! [ KEY ] P MOD
//! ```
//!
//! KEY is the big-endian libretro key code, P is 1 when pressed and MOD is
//! the big-endian modifier mask.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};

/// One past the highest libretro key code
pub const RETROK_LAST: u32 = 324;
pub const KEY_EVENT_LEN: usize = 7;

const WORDS: usize = (RETROK_LAST as usize).div_ceil(64);

bitflags! {
    /// Modifier keys held during a key event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyMod: u16 {
        const SHIFT     = 0x01;
        const CTRL      = 0x02;
        const ALT       = 0x04;
        const META      = 0x08;
        const NUMLOCK   = 0x10;
        const CAPSLOCK  = 0x20;
        const SCROLLOCK = 0x40;
    }
}

/// A decoded key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: u32,
    pub pressed: bool,
    pub modifiers: KeyMod,
}

impl KeyEvent {
    /// `None` unless `data` is exactly one event
    pub fn decode(data: &[u8]) -> Option<Self> {
        let data: &[u8; KEY_EVENT_LEN] = data.try_into().ok()?;
        Some(Self {
            key: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            pressed: data[4] == 1,
            modifiers: KeyMod::from_bits_retain(u16::from_be_bytes([data[5], data[6]])),
        })
    }

    pub fn encode(&self) -> [u8; KEY_EVENT_LEN] {
        let mut out = [0u8; KEY_EVENT_LEN];
        out[..4].copy_from_slice(&self.key.to_be_bytes());
        out[4] = self.pressed as u8;
        out[5..].copy_from_slice(&self.modifiers.bits().to_be_bytes());
        out
    }
}

/// Pressed keys as a bitset over libretro key codes
#[derive(Debug, Default)]
pub struct KeyboardState {
    keys: [AtomicU64; WORDS],
    modifiers: AtomicU16,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a key event payload, returning what it decoded to
    pub fn set_key(&self, data: &[u8]) -> Option<KeyEvent> {
        let Some(event) = KeyEvent::decode(data) else {
            tracing::debug!("Bad key event of {} bytes", data.len());
            return None;
        };
        if event.key >= RETROK_LAST {
            tracing::debug!("Unknown key code {}", event.key);
            return None;
        }
        let (word, bit) = ((event.key / 64) as usize, 1u64 << (event.key % 64));
        if event.pressed {
            self.keys[word].fetch_or(bit, Ordering::AcqRel);
        } else {
            self.keys[word].fetch_and(!bit, Ordering::AcqRel);
        }
        self.modifiers.store(event.modifiers.bits(), Ordering::Release);
        Some(event)
    }

    pub fn is_pressed(&self, key: u32) -> bool {
        if key >= RETROK_LAST {
            return false;
        }
        let word = self.keys[(key / 64) as usize].load(Ordering::Acquire);
        (word >> (key % 64)) & 1 == 1
    }

    /// Modifiers of the last event
    pub fn modifiers(&self) -> KeyMod {
        KeyMod::from_bits_retain(self.modifiers.load(Ordering::Acquire))
    }

    pub fn clear(&self) {
        for word in &self.keys {
            word.store(0, Ordering::Release);
        }
        self.modifiers.store(0, Ordering::Release);
    }
}
