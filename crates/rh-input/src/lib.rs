//! Controller input for retrohost
//!
//! Remote clients write packed controller, keyboard and mouse payloads into
//! [`InputState`] from any thread; the core reads it through [`InputQuery`] while a tick
//! is running.

pub mod device;
pub mod keyboard;
pub mod mouse;
pub mod multitap;
pub mod pad;
pub mod state;

pub use device::{
    InputQuery, DEVICE_ANALOG, DEVICE_JOYPAD, DEVICE_KEYBOARD, DEVICE_MOUSE, DEVICE_NONE,
};
pub use keyboard::{KeyEvent, KeyMod, KeyboardState, RETROK_LAST};
pub use mouse::{MouseButtons, MouseState, MOUSE_BUTTON, MOUSE_MOVE};
pub use multitap::{Multitap, MULTITAP_PORT};
pub use pad::{PadButtons, LAST_KEY};
pub use state::{InputState, DPAD_AXES, MAX_PORT};
