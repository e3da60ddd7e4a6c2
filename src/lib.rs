//! Vietnamese input method core
//!
//! Intercepts keystrokes system-wide, lets a tone engine decide replacements,
//! and types the replacements back into the focused application, optionally
//! in a legacy Vietnamese encoding.

pub mod app_context;
pub mod codec;
pub mod config;
pub mod engine;
pub mod intercept;
pub mod logging;
pub mod stats;
pub mod typing;

pub use codec::{convert, Encoding, OutputEncoding};
pub use config::{Config, SharedConfig};
pub use engine::{EngineResponse, KeyEvent, ReplacementDirective, ToneEngine};
pub use intercept::{Dispatcher, KeyInterceptor, Modifiers, RawKeyEvent, Verdict};
pub use typing::{InjectionMode, TextSynthesizer, INJECTION_MARKER};
