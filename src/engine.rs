//! Tone-engine seam
//!
//! The tone engine owns all compositional state: it sees every forwarded key
//! and decides whether previously typed characters should be replaced. This
//! crate only drives it; `PassthroughEngine` lets the binary run without one.

use std::fmt;

/// Upper bound on backspaces a single directive may request
///
/// A local limit, not part of the engine interface, which allows any count.
/// Larger directives are refused as malformed and the key passes through.
pub const MAX_DIRECTIVE_BACKSPACES: usize = 64;

/// The projection of a hardware key-down that the engine sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub vk: u32,
    pub shift: bool,
    pub caps_lock: bool,
}

/// Delete `backspace_count` characters at the caret, then insert `insert_text`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementDirective {
    pub backspace_count: usize,
    pub insert_text: String,
}

impl ReplacementDirective {
    pub fn new(backspace_count: usize, insert_text: impl Into<String>) -> Self {
        Self {
            backspace_count,
            insert_text: insert_text.into(),
        }
    }

    /// Whether the directive is within what synthesis will carry out
    pub fn is_well_formed(&self) -> bool {
        self.backspace_count <= MAX_DIRECTIVE_BACKSPACES && !self.insert_text.contains('\0')
    }
}

/// The engine's answer to a forwarded key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResponse {
    pub handled: bool,
    pub directive: ReplacementDirective,
}

impl EngineResponse {
    /// Let the original key through
    pub fn pass() -> Self {
        Self::default()
    }

    /// Swallow the original key and apply `directive`
    pub fn replace(directive: ReplacementDirective) -> Self {
        Self {
            handled: true,
            directive,
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// The engine could not process the key
    Rejected(String),
    /// The engine is not ready (still loading, shut down)
    Unavailable,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Rejected(msg) => write!(f, "Engine rejected key: {}", msg),
            EngineError::Unavailable => write!(f, "Engine unavailable"),
        }
    }
}

impl std::error::Error for EngineError {}

/// External tone-transformation engine
pub trait ToneEngine: Send {
    fn forward(&mut self, event: KeyEvent) -> Result<EngineResponse, EngineError>;

    /// Drop the in-progress composition
    fn reset(&mut self);
}

impl<T: ToneEngine + ?Sized> ToneEngine for Box<T> {
    fn forward(&mut self, event: KeyEvent) -> Result<EngineResponse, EngineError> {
        (**self).forward(event)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Never handles a key
#[derive(Debug, Default)]
pub struct PassthroughEngine;

impl ToneEngine for PassthroughEngine {
    fn forward(&mut self, _event: KeyEvent) -> Result<EngineResponse, EngineError> {
        Ok(EngineResponse::pass())
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_limits() {
        assert!(ReplacementDirective::new(3, "việt").is_well_formed());
        assert!(ReplacementDirective::new(0, "").is_well_formed());
        assert!(ReplacementDirective::new(MAX_DIRECTIVE_BACKSPACES, "a").is_well_formed());
        assert!(!ReplacementDirective::new(MAX_DIRECTIVE_BACKSPACES + 1, "a").is_well_formed());
        assert!(!ReplacementDirective::new(1, "a\0b").is_well_formed());
    }

    #[test]
    fn test_passthrough_never_handles() {
        let mut engine = PassthroughEngine;
        let event = KeyEvent {
            vk: 0x41,
            shift: false,
            caps_lock: false,
        };
        assert_eq!(engine.forward(event).unwrap(), EngineResponse::pass());
    }
}
