//! Synthetic typing into the focused application
//!
//! Realizes replacement directives as keystrokes the OS delivers to whatever
//! window holds focus.
//!
//! # Features
//!
//! - **Injection marker**: every event is tagged so the hook can skip it
//! - **Three injection modes**: fast Unicode events, slow Unicode events for
//!   laggy apps, or clipboard + Ctrl+V for apps that drop Unicode events
//! - **Legacy output**: text is transliterated to VNI or TCVN3 per app

mod clipboard;
mod input;
mod marker;
mod synthesizer;
#[cfg(windows)]
mod win32;

pub use clipboard::{ClipboardWriter, SystemClipboard};
#[cfg(not(windows))]
pub use input::EnigoInput;
pub use input::{
    system_input, InjectionMode, SyntheticEvent, SyntheticInput, SyntheticKey, Timing,
    TypingError, UnknownMode,
};
pub use marker::{is_own_injection, INJECTION_MARKER};
pub use synthesizer::{BoxedSynthesizer, TextSynthesizer};
#[cfg(windows)]
pub use win32::Win32Input;
