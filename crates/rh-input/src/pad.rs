//! RetroPad buttons

use bitflags::bitflags;

bitflags! {
    /// RetroPad button flags, bit N is joypad id N
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PadButtons: u32 {
        const B      = 1 << 0;
        const Y      = 1 << 1;
        const SELECT = 1 << 2;
        const START  = 1 << 3;
        const UP     = 1 << 4;
        const DOWN   = 1 << 5;
        const LEFT   = 1 << 6;
        const RIGHT  = 1 << 7;
        const A      = 1 << 8;
        const X      = 1 << 9;
        const L      = 1 << 10;
        const R      = 1 << 11;
        const L2     = 1 << 12;
        const R2     = 1 << 13;
        const L3     = 1 << 14;
        const R3     = 1 << 15;
    }
}

/// Highest joypad id a core may query
pub const LAST_KEY: u32 = 15;

impl PadButtons {
    /// Payload prefix carrying these buttons, as sent by remote clients
    pub fn to_payload(self) -> [u8; 2] {
        (self.bits() as u16).to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_ids() {
        assert_eq!(PadButtons::R3.bits(), 1 << LAST_KEY);
        assert_eq!(PadButtons::A.bits().trailing_zeros(), 8);
    }

    #[test]
    fn test_to_payload() {
        let p = (PadButtons::B | PadButtons::A).to_payload();
        assert_eq!(p, [0x01, 0x01]);
    }
}
