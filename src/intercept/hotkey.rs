//! Toggle hotkey for switching Vietnamese input on and off
//!
//! Detected inside the keyboard hook itself, so the chord is swallowed before
//! the focused app sees it. Default: Ctrl+Space.

use super::keymap::vk;
use super::Modifiers;
use serde::Deserialize;

/// Configuration for the toggle chord
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HotkeyConfig {
    #[serde(default = "default_ctrl")]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub win: bool,
    /// "space", "tab", "backquote", a letter, a digit, or "f1".."f12"
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            ctrl: default_ctrl(),
            shift: false,
            alt: false,
            win: false,
            key: default_key(),
        }
    }
}

fn default_ctrl() -> bool {
    true
}
fn default_key() -> String {
    "space".into()
}

/// A resolved chord: one virtual key plus an exact modifier set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleHotkey {
    pub vk: u32,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl ToggleHotkey {
    /// None when the key name is not recognised
    pub fn from_config(config: &HotkeyConfig) -> Option<Self> {
        Some(Self {
            vk: key_code(&config.key)?,
            ctrl: config.ctrl,
            shift: config.shift,
            alt: config.alt,
            win: config.win,
        })
    }

    /// Exact match: extra held modifiers do not count as the chord
    pub fn matches(&self, vk: u32, modifiers: &Modifiers) -> bool {
        vk == self.vk
            && modifiers.ctrl == self.ctrl
            && modifiers.shift == self.shift
            && modifiers.alt == self.alt
            && modifiers.win == self.win
    }
}

impl Default for ToggleHotkey {
    fn default() -> Self {
        Self {
            vk: vk::SPACE,
            ctrl: true,
            shift: false,
            alt: false,
            win: false,
        }
    }
}

fn key_code(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("space") {
        return Some(vk::SPACE);
    }
    if name.eq_ignore_ascii_case("tab") {
        return Some(vk::TAB);
    }
    if name.eq_ignore_ascii_case("backquote") || name == "`" {
        return Some(vk::OEM_3);
    }

    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return match c.to_ascii_uppercase() {
            c @ 'A'..='Z' => Some(c as u32),
            c @ '0'..='9' => Some(c as u32),
            _ => None,
        };
    }

    let digits = name.strip_prefix(['f', 'F'])?;
    match digits.parse::<u32>() {
        Ok(n @ 1..=12) => Some(vk::F1 + n - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(ctrl: bool, shift: bool, alt: bool) -> Modifiers {
        Modifiers {
            ctrl,
            shift,
            alt,
            ..Modifiers::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = HotkeyConfig::default();
        assert!(config.ctrl);
        assert!(!config.shift);
        assert_eq!(config.key, "space");
        assert_eq!(ToggleHotkey::from_config(&config), Some(ToggleHotkey::default()));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_code("Space"), Some(0x20));
        assert_eq!(key_code("z"), Some(0x5A));
        assert_eq!(key_code("7"), Some(0x37));
        assert_eq!(key_code("F12"), Some(0x7B));
        assert_eq!(key_code("`"), Some(0xC0));
        assert_eq!(key_code("f13"), None);
        assert_eq!(key_code("ctrl"), None);
        assert_eq!(key_code("!"), None);
    }

    #[test]
    fn test_matches_exact_modifiers() {
        let hotkey = ToggleHotkey::default();
        assert!(hotkey.matches(vk::SPACE, &mods(true, false, false)));
        assert!(!hotkey.matches(vk::SPACE, &mods(false, false, false)));
        assert!(!hotkey.matches(vk::SPACE, &mods(true, true, false)));
        assert!(!hotkey.matches(0x41, &mods(true, false, false)));
    }

    #[test]
    fn test_caps_lock_does_not_affect_match() {
        let hotkey = ToggleHotkey::default();
        let held = Modifiers {
            ctrl: true,
            caps_lock: true,
            ..Modifiers::default()
        };
        assert!(hotkey.matches(vk::SPACE, &held));
    }
}
