//! Clipboard writes for the paste injection mode

use super::input::TypingError;
use arboard::Clipboard;

/// Destination for text pasted with Ctrl+V
pub trait ClipboardWriter {
    /// Replace the clipboard contents with plain Unicode text
    fn set_text(&mut self, text: &str) -> Result<(), TypingError>;
}

impl<T: ClipboardWriter + ?Sized> ClipboardWriter for Box<T> {
    fn set_text(&mut self, text: &str) -> Result<(), TypingError> {
        (**self).set_text(text)
    }
}

/// The system clipboard via arboard
///
/// Opened fresh for every write and closed again, so another process can
/// take the clipboard between replacements.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardWriter for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), TypingError> {
        let mut clipboard = Clipboard::new().map_err(|e| {
            TypingError::Clipboard(format!("Failed to open clipboard: {}", e))
        })?;
        clipboard
            .set_text(text)
            .map_err(|e| TypingError::Clipboard(format!("Failed to set clipboard: {}", e)))
    }
}
