//! System-wide keystroke interception
//!
//! Every hardware key-down passes through [`Dispatcher::dispatch`] before the
//! focused application sees it. Relevant keys are forwarded to the tone
//! engine; when the engine asks for a replacement, the directive is
//! synthesized and the original key is swallowed.
//!
//! # Per-event order
//!
//! 1. Our own injected events pass through untouched
//! 2. Nested events during a dispatch pass through
//! 3. The toggle chord flips Vietnamese input and is swallowed; with smart
//!    switch on, the new state is remembered for the foreground app, and
//!    bringing an app back to the front restores its state first
//! 4. Disabled, or an excluded app in front: pass through
//! 5. A Ctrl press resets the composition
//! 6. Ctrl/Alt shortcuts reset and pass through
//! 7. Boundary keys are forwarded, then always reset
//! 8. Character keys are forwarded
//! 9. Everything else passes through

mod hotkey;
pub mod keymap;
#[cfg(windows)]
mod win_hook;

pub use hotkey::{HotkeyConfig, ToggleHotkey};
#[cfg(windows)]
pub use win_hook::{HookError, HookHandle, install, request_quit, run_message_loop};

use crate::app_context::AppContext;
use crate::config::SharedConfig;
use crate::engine::{KeyEvent, ToneEngine};
use crate::stats::{SharedStats, StatKind, Timer};
use crate::typing::{is_own_injection, BoxedSynthesizer};
use keymap::KeyClass;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, trace, warn};

/// Modifier and lock state at the time of a key-down
///
/// Read failures on the platform side report "not pressed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub win: bool,
    pub caps_lock: bool,
}

/// A key-down as the hook sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub vk: u32,
    /// `dwExtraInfo` of the event; carries the injection marker for our own input
    pub extra_info: usize,
    pub modifiers: Modifiers,
}

impl RawKeyEvent {
    pub fn new(vk: u32, modifiers: Modifiers) -> Self {
        Self {
            vk,
            extra_info: 0,
            modifiers,
        }
    }

    /// The projection forwarded to the tone engine
    pub fn key_event(&self) -> KeyEvent {
        KeyEvent {
            vk: self.vk,
            shift: self.modifiers.shift,
            caps_lock: self.modifiers.caps_lock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    PassThrough,
    Swallow,
}

/// Why a dispatch was skipped without classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Reentry,
}

/// Holds the dispatch flag for the duration of one forward-and-synthesize
pub struct DispatchGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> DispatchGuard<'a> {
    pub fn try_acquire(busy: &'a AtomicBool) -> Result<Self, SkipReason> {
        if busy.swap(true, Ordering::AcqRel) {
            trace!("dispatch already in progress, skipping nested event");
            return Err(SkipReason::Reentry);
        }
        Ok(Self { busy })
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Classifies events and drives the engine, app context and synthesizer
pub struct KeyInterceptor {
    engine: Box<dyn ToneEngine>,
    app: Box<dyn AppContext>,
    synth: BoxedSynthesizer,
    config: Arc<SharedConfig>,
    enabled: Arc<AtomicBool>,
    stats: SharedStats,
    // Smart switch: on/off per app, and the app the last event went to
    app_states: HashMap<String, bool>,
    last_app: Option<String>,
}

impl KeyInterceptor {
    pub fn new(
        engine: Box<dyn ToneEngine>,
        app: Box<dyn AppContext>,
        synth: BoxedSynthesizer,
        config: Arc<SharedConfig>,
        stats: SharedStats,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.read(|c| c.enabled)));
        Self {
            engine,
            app,
            synth,
            config,
            enabled,
            stats,
            app_states: HashMap::new(),
            last_app: None,
        }
    }

    /// Steps 3-9 of the per-event order; the caller handles the marker and guard
    pub fn handle(&mut self, event: &RawKeyEvent) -> Verdict {
        let app = self.app.foreground_app();
        let smart_switch = self.config.read(|c| c.apps.smart_switch);
        if smart_switch {
            self.follow_app(app.as_deref());
        }

        if self.toggle_hotkey().matches(event.vk, &event.modifiers) {
            let now_enabled = !self.enabled.fetch_xor(true, Ordering::AcqRel);
            if let (true, Some(name)) = (smart_switch, app.as_deref()) {
                self.app_states.insert(name.to_string(), now_enabled);
            }
            self.reset();
            self.stats.record(StatKind::Toggle);
            self.stats.record(StatKind::Swallowed);
            info!(enabled = now_enabled, "Vietnamese input toggled");
            return Verdict::Swallow;
        }

        if !self.enabled.load(Ordering::Acquire) {
            return Verdict::PassThrough;
        }
        if self.app.is_excluded(app.as_deref()) {
            return Verdict::PassThrough;
        }

        let class = keymap::classify(event.vk);
        if class == KeyClass::Reset {
            self.reset();
            return Verdict::PassThrough;
        }
        if event.modifiers.ctrl || event.modifiers.alt {
            self.reset();
            return Verdict::PassThrough;
        }

        match class {
            KeyClass::Boundary => {
                let verdict = self.forward(event, app.as_deref());
                self.reset();
                verdict
            }
            KeyClass::Character => self.forward(event, app.as_deref()),
            KeyClass::Reset | KeyClass::Other => Verdict::PassThrough,
        }
    }

    fn forward(&mut self, event: &RawKeyEvent, app: Option<&str>) -> Verdict {
        self.stats.record(StatKind::Forwarded);
        let _timer = Timer::new(&self.stats);

        let response = match self.engine.forward(event.key_event()) {
            Ok(response) => response,
            Err(e) => {
                self.stats.record(StatKind::EngineFailure);
                warn!(error = %e, "tone engine failed, passing key through");
                return Verdict::PassThrough;
            }
        };
        if !response.handled {
            return Verdict::PassThrough;
        }
        if !response.directive.is_well_formed() {
            self.stats.record(StatKind::EngineFailure);
            warn!(
                backspaces = response.directive.backspace_count,
                "malformed directive, passing key through"
            );
            return Verdict::PassThrough;
        }

        let encoding = self.app.output_encoding(app);
        let mode = self.config.injection_mode();
        debug!(
            backspaces = response.directive.backspace_count,
            %mode,
            %encoding,
            "replacing"
        );
        if let Err(e) = self.synth.send(&response.directive, mode, encoding) {
            self.stats.record(StatKind::SynthFailure);
            warn!(error = %e, %mode, "synthesis failed");
        }
        self.stats.record(StatKind::Swallowed);
        Verdict::Swallow
    }

    /// Restore the remembered state when focus has moved to another app
    ///
    /// Apps never toggled start from `enabled` in the config. An unknown
    /// foreground app keeps the current state.
    fn follow_app(&mut self, app: Option<&str>) {
        let Some(name) = app else {
            return;
        };
        if self.last_app.as_deref() == Some(name) {
            return;
        }
        self.last_app = Some(name.to_string());
        let enabled = match self.app_states.get(name) {
            Some(&enabled) => enabled,
            None => self.config.read(|c| c.enabled),
        };
        if self.enabled.swap(enabled, Ordering::AcqRel) != enabled {
            debug!(enabled, "restored input state for app");
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.stats.record(StatKind::Reset);
    }

    /// Unknown key names fall back to Ctrl+Space; `run` warns about them at startup
    fn toggle_hotkey(&self) -> ToggleHotkey {
        self.config
            .read(|c| ToggleHotkey::from_config(&c.toggle_hotkey))
            .unwrap_or_default()
    }

    /// Shared switch, flipped by the toggle chord
    pub fn enabled(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }
}

/// Entry point for hook callbacks: marker check, reentrancy guard, then the
/// interceptor
pub struct Dispatcher {
    busy: AtomicBool,
    interceptor: Mutex<KeyInterceptor>,
    enabled: Arc<AtomicBool>,
    stats: SharedStats,
}

impl Dispatcher {
    pub fn new(interceptor: KeyInterceptor) -> Self {
        Self {
            busy: AtomicBool::new(false),
            enabled: interceptor.enabled(),
            stats: Arc::clone(&interceptor.stats),
            interceptor: Mutex::new(interceptor),
        }
    }

    #[hotpath::measure]
    pub fn dispatch(&self, event: &RawKeyEvent) -> Verdict {
        self.stats.record(StatKind::Seen);
        if is_own_injection(event.extra_info) {
            self.stats.record(StatKind::OwnInjected);
            return Verdict::PassThrough;
        }
        let Ok(_guard) = DispatchGuard::try_acquire(&self.busy) else {
            self.stats.record(StatKind::Reentrant);
            return Verdict::PassThrough;
        };
        let mut interceptor = self
            .interceptor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        interceptor.handle(event)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn stats(&self) -> &SharedStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_until_dropped() {
        let busy = AtomicBool::new(false);
        let guard = DispatchGuard::try_acquire(&busy).unwrap();
        assert!(matches!(
            DispatchGuard::try_acquire(&busy),
            Err(SkipReason::Reentry)
        ));
        drop(guard);
        assert!(DispatchGuard::try_acquire(&busy).is_ok());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn bail(busy: &AtomicBool) -> Result<(), &'static str> {
            let _guard = DispatchGuard::try_acquire(busy).map_err(|_| "busy")?;
            Err("engine failed")
        }
        let busy = AtomicBool::new(false);
        assert_eq!(bail(&busy), Err("engine failed"));
        assert!(!busy.load(Ordering::Acquire));
    }

    #[test]
    fn test_key_event_projection() {
        let event = RawKeyEvent::new(
            0x41,
            Modifiers {
                shift: true,
                caps_lock: true,
                win: true,
                ..Modifiers::default()
            },
        );
        assert_eq!(
            event.key_event(),
            KeyEvent {
                vk: 0x41,
                shift: true,
                caps_lock: true
            }
        );
    }
}
