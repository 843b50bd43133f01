//! Answers the core's input-state queries

use crate::mouse::MouseButtons;
use crate::pad::LAST_KEY;
use crate::state::{InputState, MAX_PORT};

pub const DEVICE_NONE: u32 = 0;
pub const DEVICE_JOYPAD: u32 = 1;
pub const DEVICE_MOUSE: u32 = 2;
pub const DEVICE_KEYBOARD: u32 = 3;
pub const DEVICE_LIGHTGUN: u32 = 4;
pub const DEVICE_ANALOG: u32 = 5;
pub const DEVICE_POINTER: u32 = 6;

pub const DEVICE_INDEX_ANALOG_LEFT: u32 = 0;
pub const DEVICE_INDEX_ANALOG_RIGHT: u32 = 1;
pub const DEVICE_ID_ANALOG_X: u32 = 0;
pub const DEVICE_ID_ANALOG_Y: u32 = 1;

pub const DEVICE_ID_MOUSE_X: u32 = 0;
pub const DEVICE_ID_MOUSE_Y: u32 = 1;
pub const DEVICE_ID_MOUSE_LEFT: u32 = 2;
pub const DEVICE_ID_MOUSE_RIGHT: u32 = 3;
pub const DEVICE_ID_MOUSE_MIDDLE: u32 = 6;

/// Pressed value of a digital button
pub const KEY_PRESSED: i16 = 1;
pub const KEY_RELEASED: i16 = 0;

/// A single input-state query as issued by a core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputQuery {
    pub port: u32,
    pub device: u32,
    pub index: u32,
    pub id: u32,
}

impl InputQuery {
    pub fn new(port: u32, device: u32, index: u32, id: u32) -> Self {
        Self {
            port,
            device,
            index,
            id,
        }
    }

    /// Value the core gets back for this query
    pub fn respond(&self, input: &InputState) -> i16 {
        if self.port as usize >= MAX_PORT {
            return KEY_RELEASED;
        }
        let port = self.port as usize;

        match self.device {
            DEVICE_KEYBOARD => return pressed(input.keyboard().is_pressed(self.id)),
            DEVICE_MOUSE => return mouse(input, self.id),
            _ => {}
        }

        if self.device == DEVICE_ANALOG {
            if self.index > DEVICE_INDEX_ANALOG_RIGHT || self.id > DEVICE_ID_ANALOG_Y {
                return KEY_RELEASED;
            }
            let axis = (self.index * 2 + self.id) as usize;
            let value = input.axis(port, axis);
            if value != 0 {
                return value;
            }
        }

        if self.id > LAST_KEY || self.index > 0 || self.device != DEVICE_JOYPAD {
            return KEY_RELEASED;
        }
        pressed(input.is_key_pressed(port, self.id))
    }
}

fn pressed(down: bool) -> i16 {
    if down {
        KEY_PRESSED
    } else {
        KEY_RELEASED
    }
}

fn mouse(input: &InputState, id: u32) -> i16 {
    let mouse = input.mouse();
    let button = |b| pressed(mouse.buttons().contains(b));
    match id {
        DEVICE_ID_MOUSE_X => mouse.pop_x(),
        DEVICE_ID_MOUSE_Y => mouse.pop_y(),
        DEVICE_ID_MOUSE_LEFT => button(MouseButtons::LEFT),
        DEVICE_ID_MOUSE_RIGHT => button(MouseButtons::RIGHT),
        DEVICE_ID_MOUSE_MIDDLE => button(MouseButtons::MIDDLE),
        _ => KEY_RELEASED,
    }
}
