//! Virtual-key classification
//!
//! Codes are Windows virtual-key codes, which is what the hook delivers.

/// Windows virtual-key codes used by the interceptor
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const CAPITAL: u32 = 0x14;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const PRIOR: u32 = 0x21;
    pub const DOWN: u32 = 0x28;
    pub const INSERT: u32 = 0x2D;
    pub const DELETE: u32 = 0x2E;
    pub const LWIN: u32 = 0x5B;
    pub const RWIN: u32 = 0x5C;
    pub const NUMPAD0: u32 = 0x60;
    pub const DIVIDE: u32 = 0x6F;
    pub const F1: u32 = 0x70;
    pub const LCONTROL: u32 = 0xA2;
    pub const RCONTROL: u32 = 0xA3;
    pub const OEM_1: u32 = 0xBA;
    pub const OEM_3: u32 = 0xC0;
    pub const OEM_4: u32 = 0xDB;
    pub const OEM_5: u32 = 0xDC;
    pub const OEM_6: u32 = 0xDD;
    pub const OEM_7: u32 = 0xDE;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// A Ctrl key press: drop the composition
    Reset,
    /// Letters, digits, backspace and the bracket keys the engine uses as marks
    Character,
    /// Ends a word: whitespace, punctuation, navigation, numpad
    Boundary,
    /// Function keys, bare modifiers, media keys
    Other,
}

pub fn classify(code: u32) -> KeyClass {
    match code {
        vk::CONTROL | vk::LCONTROL | vk::RCONTROL => KeyClass::Reset,
        vk::BACK | 0x30..=0x39 | 0x41..=0x5A | vk::OEM_4 | vk::OEM_6 => KeyClass::Character,
        vk::SPACE | vk::RETURN | vk::TAB | vk::ESCAPE => KeyClass::Boundary,
        vk::PRIOR..=vk::DOWN | vk::INSERT | vk::DELETE => KeyClass::Boundary,
        vk::OEM_1..=vk::OEM_3 | vk::OEM_5 | vk::OEM_7 => KeyClass::Boundary,
        vk::NUMPAD0..=vk::DIVIDE => KeyClass::Boundary,
        _ => KeyClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_keys_reset() {
        for code in [vk::CONTROL, vk::LCONTROL, vk::RCONTROL] {
            assert_eq!(classify(code), KeyClass::Reset);
        }
    }

    #[test]
    fn test_character_keys() {
        for code in [vk::BACK, 0x30, 0x39, 0x41, 0x5A, vk::OEM_4, vk::OEM_6] {
            assert_eq!(classify(code), KeyClass::Character, "{code:#x}");
        }
    }

    #[test]
    fn test_boundary_keys() {
        for code in [
            vk::SPACE,
            vk::RETURN,
            vk::TAB,
            vk::ESCAPE,
            vk::PRIOR,
            vk::DOWN,
            vk::DELETE,
            vk::OEM_1,
            0xBC, // comma
            0xBE, // period
            vk::OEM_3,
            vk::OEM_5,
            vk::OEM_7,
            vk::NUMPAD0,
            vk::DIVIDE,
        ] {
            assert_eq!(classify(code), KeyClass::Boundary, "{code:#x}");
        }
    }

    #[test]
    fn test_everything_else_is_ignored() {
        for code in [
            vk::SHIFT,
            vk::MENU,
            vk::CAPITAL,
            vk::LWIN,
            vk::RWIN,
            vk::F1,
            0x7B, // F12
            0xAD, // volume mute
            0xB3, // media play/pause
        ] {
            assert_eq!(classify(code), KeyClass::Other, "{code:#x}");
        }
    }
}
