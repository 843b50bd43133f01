//! Relative mouse state
//!
//! Motion accumulates until the core reads it; each read of an axis
//! consumes what has been collected so far.

use bitflags::bitflags;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

/// First byte of a mouse payload
pub const MOUSE_MOVE: u8 = 0;
pub const MOUSE_BUTTON: u8 = 1;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

#[derive(Debug, Default)]
pub struct MouseState {
    dx: AtomicI32,
    dy: AtomicI32,
    buttons: AtomicU8,
}

impl MouseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches a framed payload: a [`MOUSE_MOVE`] or [`MOUSE_BUTTON`]
    /// tag followed by the event bytes
    pub fn set_input(&self, data: &[u8]) {
        match data.split_first() {
            Some((&MOUSE_MOVE, pos)) => self.shift_pos(pos),
            Some((&MOUSE_BUTTON, &[buttons])) => self.set_buttons(buttons),
            _ => tracing::debug!("Bad mouse event of {} bytes", data.len()),
        }
    }

    /// Adds relative motion from big-endian `dx`, `dy` pairs
    pub fn shift_pos(&self, data: &[u8]) {
        let Ok(&[x0, x1, y0, y1]) = <&[u8; 4]>::try_from(data) else {
            return;
        };
        self.dx.fetch_add(i16::from_be_bytes([x0, x1]) as i32, Ordering::AcqRel);
        self.dy.fetch_add(i16::from_be_bytes([y0, y1]) as i32, Ordering::AcqRel);
    }

    pub fn pop_x(&self) -> i16 {
        saturate(self.dx.swap(0, Ordering::AcqRel))
    }

    pub fn pop_y(&self) -> i16 {
        saturate(self.dy.swap(0, Ordering::AcqRel))
    }

    pub fn set_buttons(&self, buttons: u8) {
        self.buttons.store(buttons, Ordering::Release);
    }

    pub fn buttons(&self) -> MouseButtons {
        MouseButtons::from_bits_truncate(self.buttons.load(Ordering::Acquire))
    }

    pub fn clear(&self) {
        self.dx.store(0, Ordering::Release);
        self.dy.store(0, Ordering::Release);
        self.buttons.store(0, Ordering::Release);
    }
}

fn saturate(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion(dx: i16, dy: i16) -> [u8; 4] {
        let mut data = [0u8; 4];
        data[..2].copy_from_slice(&dx.to_be_bytes());
        data[2..].copy_from_slice(&dy.to_be_bytes());
        data
    }

    #[test]
    fn test_pos() {
        let mouse = MouseState::new();
        mouse.shift_pos(&motion(-10123, 5678));
        assert_eq!(mouse.pop_x(), -10123);
        assert_eq!(mouse.pop_y(), 5678);
        assert_eq!((mouse.pop_x(), mouse.pop_y()), (0, 0));
    }

    #[test]
    fn test_little_endian_is_misread() {
        let mouse = MouseState::new();
        let mut data = [0u8; 4];
        data[..2].copy_from_slice(&(-1234i16).to_le_bytes());
        data[2..].copy_from_slice(&5678i16.to_le_bytes());
        mouse.shift_pos(&data);
        assert_eq!((mouse.pop_x(), mouse.pop_y()), (12027, 11798));
    }

    #[test]
    fn test_motion_accumulates() {
        let mouse = MouseState::new();
        mouse.shift_pos(&motion(3, -4));
        mouse.shift_pos(&motion(2, -1));
        mouse.shift_pos(&[1, 2, 3]);
        assert_eq!((mouse.pop_x(), mouse.pop_y()), (5, -5));

        mouse.shift_pos(&motion(i16::MAX, 0));
        mouse.shift_pos(&motion(i16::MAX, 0));
        assert_eq!(mouse.pop_x(), i16::MAX);
    }

    #[test]
    fn test_buttons() {
        let mouse = MouseState::new();
        for (data, expected) in [
            (1 + 2 + 4, MouseButtons::all()),
            (0, MouseButtons::empty()),
            (2, MouseButtons::RIGHT),
            (1 + 4, MouseButtons::LEFT | MouseButtons::MIDDLE),
        ] {
            mouse.set_buttons(data);
            assert_eq!(mouse.buttons(), expected);
        }
    }

    #[test]
    fn test_framed_input() {
        let mouse = MouseState::new();
        let mut data = vec![MOUSE_MOVE];
        data.extend_from_slice(&motion(7, 8));
        mouse.set_input(&data);
        mouse.set_input(&[MOUSE_BUTTON, 1]);
        mouse.set_input(&[MOUSE_BUTTON]);
        mouse.set_input(&[9, 1]);

        assert_eq!((mouse.pop_x(), mouse.pop_y()), (7, 8));
        assert_eq!(mouse.buttons(), MouseButtons::LEFT);
    }
}
