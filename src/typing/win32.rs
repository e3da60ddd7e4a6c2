//! `SendInput` backend

use super::input::{SyntheticEvent, SyntheticInput, SyntheticKey, TypingError};
use std::mem;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, SendInput, VIRTUAL_KEY, VK_BACK, VK_CONTROL,
};

const VK_V: VIRTUAL_KEY = VIRTUAL_KEY(0x56);

// Hardware scan codes, for apps that read them instead of the virtual key
const SCAN_BACK: u16 = 0x0E;
const SCAN_CONTROL: u16 = 0x1D;
const SCAN_V: u16 = 0x2F;

/// Emits events through `SendInput`, tagged via `dwExtraInfo`
pub struct Win32Input;

impl SyntheticInput for Win32Input {
    fn send(&mut self, events: &[SyntheticEvent]) -> Result<(), TypingError> {
        let inputs: Vec<INPUT> = events.iter().map(to_input).collect();
        // SAFETY: `inputs` is a valid slice of fully initialised INPUT structs.
        let sent = unsafe { SendInput(&inputs, mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(TypingError::Input(format!(
                "SendInput accepted {} of {} events",
                sent,
                inputs.len()
            )));
        }
        Ok(())
    }
}

fn to_input(event: &SyntheticEvent) -> INPUT {
    let (vk, scan, mut flags) = match event.key {
        SyntheticKey::Backspace => (VK_BACK, SCAN_BACK, KEYBD_EVENT_FLAGS(0)),
        SyntheticKey::Control => (VK_CONTROL, SCAN_CONTROL, KEYBD_EVENT_FLAGS(0)),
        SyntheticKey::V => (VK_V, SCAN_V, KEYBD_EVENT_FLAGS(0)),
        SyntheticKey::Unit(unit) => (VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
    };
    if event.key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: event.marker,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::INJECTION_MARKER;

    #[test]
    fn test_unicode_unit_uses_scan_field() {
        let input = to_input(&SyntheticEvent::up(SyntheticKey::Unit(0x1EC7)));
        // SAFETY: keyboard inputs always populate the `ki` variant.
        let ki = unsafe { input.Anonymous.ki };
        assert_eq!(ki.wVk, VIRTUAL_KEY(0));
        assert_eq!(ki.wScan, 0x1EC7);
        assert_eq!(ki.dwFlags, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP);
        assert_eq!(ki.dwExtraInfo, INJECTION_MARKER);
    }

    #[test]
    fn test_backspace_is_virtual_key() {
        let input = to_input(&SyntheticEvent::down(SyntheticKey::Backspace));
        // SAFETY: keyboard inputs always populate the `ki` variant.
        let ki = unsafe { input.Anonymous.ki };
        assert_eq!(ki.wVk, VK_BACK);
        assert_eq!(ki.wScan, SCAN_BACK);
        assert_eq!(ki.dwFlags, KEYBD_EVENT_FLAGS(0));
    }
}
