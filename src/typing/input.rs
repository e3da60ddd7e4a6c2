//! Synthetic keyboard events and the backends that deliver them
//!
//! Three strategies cover applications with different input robustness:
//! - **Fast**: one raw Unicode key event per UTF-16 code unit, short delays
//! - **Slow**: the same events with longer delays for laggy apps
//! - **Clipboard**: write the text to the clipboard, then paste with Ctrl+V

use super::marker::INJECTION_MARKER;
use serde::Deserialize;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

/// How replacement text reaches the focused application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMode {
    #[default]
    Fast,
    Slow,
    /// Overwrites the clipboard, for apps that drop raw Unicode events
    Clipboard,
}

/// Returned when an injection mode name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl std::fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown injection mode '{}' (expected fast, slow or clipboard)",
            self.0
        )
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for InjectionMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(InjectionMode::Fast),
            "slow" => Ok(InjectionMode::Slow),
            "clipboard" | "paste" => Ok(InjectionMode::Clipboard),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl InjectionMode {

    /// Delays used when synthesizing under this mode
    pub fn timing(self) -> Timing {
        match self {
            InjectionMode::Fast => Timing {
                key_down: Duration::from_millis(8),
                key_up: Duration::from_millis(8),
                after_backspaces: Duration::from_millis(20),
                per_char: Duration::from_millis(5),
            },
            InjectionMode::Slow => Timing {
                key_down: Duration::from_millis(15),
                key_up: Duration::from_millis(15),
                after_backspaces: Duration::from_millis(30),
                per_char: Duration::from_millis(15),
            },
            InjectionMode::Clipboard => Timing {
                key_down: Duration::from_millis(10),
                key_up: Duration::from_millis(10),
                after_backspaces: Duration::from_millis(20),
                per_char: Duration::ZERO,
            },
        }
    }
}

impl std::fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InjectionMode::Fast => "fast",
            InjectionMode::Slow => "slow",
            InjectionMode::Clipboard => "clipboard",
        };
        f.write_str(name)
    }
}

/// Per-mode synthesis delays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Backspace down to backspace up
    pub key_down: Duration,
    /// Backspace up to the next event
    pub key_up: Duration,
    /// Settle time between the last backspace and the inserted text
    pub after_backspaces: Duration,
    /// After each character pair (Fast/Slow only)
    pub per_char: Duration,
}

/// Error type for typing operations
#[derive(Debug)]
pub enum TypingError {
    Input(String),
    Clipboard(String),
}

impl std::fmt::Display for TypingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypingError::Input(msg) => write!(f, "Input error: {}", msg),
            TypingError::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),
        }
    }
}

impl std::error::Error for TypingError {}

/// Keys the synthesizer can emit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticKey {
    Backspace,
    Control,
    /// The V key of the paste chord
    V,
    /// One UTF-16 code unit, delivered as a raw Unicode key event
    Unit(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntheticEvent {
    pub key: SyntheticKey,
    pub key_up: bool,
    pub marker: usize,
}

impl SyntheticEvent {
    pub fn down(key: SyntheticKey) -> Self {
        Self {
            key,
            key_up: false,
            marker: INJECTION_MARKER,
        }
    }

    pub fn up(key: SyntheticKey) -> Self {
        Self {
            key,
            key_up: true,
            marker: INJECTION_MARKER,
        }
    }
}

/// A sink for synthetic key events
pub trait SyntheticInput {
    /// Deliver events in order, as one batch
    fn send(&mut self, events: &[SyntheticEvent]) -> Result<(), TypingError>;

    /// Wait between events
    fn settle(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

impl<T: SyntheticInput + ?Sized> SyntheticInput for Box<T> {
    fn send(&mut self, events: &[SyntheticEvent]) -> Result<(), TypingError> {
        (**self).send(events)
    }

    fn settle(&mut self, delay: Duration) {
        (**self).settle(delay)
    }
}

/// Keyboard input through enigo, for platforms without the Win32 backend
#[cfg(not(windows))]
pub struct EnigoInput {
    enigo: enigo::Enigo,
}

#[cfg(not(windows))]
impl EnigoInput {
    pub fn new() -> Result<Self, TypingError> {
        let settings = enigo::Settings {
            // Tags events so a macOS event tap can recognise them
            event_source_user_data: Some(INJECTION_MARKER as i64),
            ..enigo::Settings::default()
        };
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| TypingError::Input(format!("Failed to initialize Enigo: {}", e)))?;
        Ok(Self { enigo })
    }

    fn key_for(key: SyntheticKey) -> Result<enigo::Key, TypingError> {
        use enigo::Key;
        match key {
            SyntheticKey::Backspace => Ok(Key::Backspace),
            SyntheticKey::Control => Ok(Self::modifier_key()),
            SyntheticKey::V => Ok(Key::Unicode('v')),
            SyntheticKey::Unit(unit) => char::from_u32(unit as u32)
                .map(Key::Unicode)
                .ok_or_else(|| TypingError::Input(format!("unpaired surrogate {:#06x}", unit))),
        }
    }

    /// Platform paste modifier (Cmd on macOS, Ctrl elsewhere)
    fn modifier_key() -> enigo::Key {
        #[cfg(target_os = "macos")]
        {
            enigo::Key::Meta
        }
        #[cfg(not(target_os = "macos"))]
        {
            enigo::Key::Control
        }
    }
}

#[cfg(not(windows))]
impl SyntheticInput for EnigoInput {
    fn send(&mut self, events: &[SyntheticEvent]) -> Result<(), TypingError> {
        use enigo::{Direction, Keyboard};
        for event in events {
            let key = Self::key_for(event.key)?;
            let direction = if event.key_up {
                Direction::Release
            } else {
                Direction::Press
            };
            self.enigo
                .key(key, direction)
                .map_err(|e| TypingError::Input(format!("Failed to send key: {}", e)))?;
        }
        Ok(())
    }
}

/// The platform's default input backend
pub fn system_input() -> Result<Box<dyn SyntheticInput>, TypingError> {
    #[cfg(windows)]
    {
        Ok(Box::new(super::win32::Win32Input))
    }
    #[cfg(not(windows))]
    {
        Ok(Box::new(EnigoInput::new()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_mode_from_str() {
        assert_eq!("fast".parse::<InjectionMode>(), Ok(InjectionMode::Fast));
        assert_eq!("Slow".parse::<InjectionMode>(), Ok(InjectionMode::Slow));
        assert_eq!("clipboard".parse::<InjectionMode>(), Ok(InjectionMode::Clipboard));
        assert_eq!(" PASTE ".parse::<InjectionMode>(), Ok(InjectionMode::Clipboard));
    }

    #[test]
    fn test_unknown_injection_mode_is_rejected() {
        let err = "turbo".parse::<InjectionMode>().unwrap_err();
        assert_eq!(err, UnknownMode("turbo".into()));
        assert!(err.to_string().contains("fast, slow or clipboard"));
        assert!("".parse::<InjectionMode>().is_err());
    }

    #[test]
    fn test_slow_mode_is_slower_everywhere() {
        let fast = InjectionMode::Fast.timing();
        let slow = InjectionMode::Slow.timing();
        assert!(slow.key_down > fast.key_down);
        assert!(slow.after_backspaces > fast.after_backspaces);
        assert!(slow.per_char > fast.per_char);
    }

    #[test]
    fn test_events_carry_marker() {
        let down = SyntheticEvent::down(SyntheticKey::Backspace);
        let up = SyntheticEvent::up(SyntheticKey::Backspace);
        assert_eq!(down.marker, INJECTION_MARKER);
        assert!(!down.key_up);
        assert!(up.key_up);
    }
}
