//! Turns replacement directives into synthetic keystrokes
//!
//! Deletes with backspaces, then inserts the (optionally transliterated) text
//! with the strategy the configuration selects. Every event carries the
//! injection marker so the hook lets it through untouched.

use super::clipboard::ClipboardWriter;
use super::input::{InjectionMode, SyntheticEvent, SyntheticInput, SyntheticKey, Timing, TypingError};
use crate::codec::{self, Encoding, OutputEncoding};
use crate::engine::ReplacementDirective;
use std::borrow::Cow;
use std::time::Duration;

const CHORD_AFTER_WRITE: Duration = Duration::from_millis(10);
const CHORD_CTRL_DOWN: Duration = Duration::from_millis(5);
const CHORD_V_DOWN: Duration = Duration::from_millis(10);
const CHORD_V_UP: Duration = Duration::from_millis(5);

/// Synthesizer over boxed backends, as the hook holds it
pub type BoxedSynthesizer =
    TextSynthesizer<Box<dyn SyntheticInput + Send>, Box<dyn ClipboardWriter + Send>>;

pub struct TextSynthesizer<I, C> {
    input: I,
    clipboard: C,
}

impl<I: SyntheticInput, C: ClipboardWriter> TextSynthesizer<I, C> {
    pub fn new(input: I, clipboard: C) -> Self {
        Self { input, clipboard }
    }

    /// Apply `directive` to the focused application
    ///
    /// Delivery is best-effort: the first backend failure stops the sequence
    /// and is returned for the caller to log. A clipboard that cannot be
    /// written leaves the deletions in place and is not an error.
    #[hotpath::measure]
    pub fn send(
        &mut self,
        directive: &ReplacementDirective,
        mode: InjectionMode,
        encoding: OutputEncoding,
    ) -> Result<(), TypingError> {
        if directive.backspace_count == 0 && directive.insert_text.is_empty() {
            return Ok(());
        }

        let timing = mode.timing();
        self.send_backspaces(directive.backspace_count, &timing)?;

        if directive.insert_text.is_empty() {
            return Ok(());
        }
        if directive.backspace_count > 0 {
            self.input.settle(timing.after_backspaces);
        }

        let text = encode_for(&directive.insert_text, encoding);
        match mode {
            InjectionMode::Fast | InjectionMode::Slow => self.type_units(&text, timing.per_char),
            InjectionMode::Clipboard => self.paste(&text),
        }
    }

    fn send_backspaces(&mut self, count: usize, timing: &Timing) -> Result<(), TypingError> {
        for _ in 0..count {
            self.input.send(&[SyntheticEvent::down(SyntheticKey::Backspace)])?;
            self.input.settle(timing.key_down);
            self.input.send(&[SyntheticEvent::up(SyntheticKey::Backspace)])?;
            self.input.settle(timing.key_up);
        }
        Ok(())
    }

    /// One raw Unicode down/up pair per UTF-16 code unit
    fn type_units(&mut self, text: &str, per_char: Duration) -> Result<(), TypingError> {
        for unit in text.encode_utf16() {
            // High surrogates are dropped, so characters outside the BMP
            // arrive corrupted
            if (0xD800..=0xDBFF).contains(&unit) {
                continue;
            }
            let key = SyntheticKey::Unit(unit);
            self.input
                .send(&[SyntheticEvent::down(key), SyntheticEvent::up(key)])?;
            self.input.settle(per_char);
        }
        Ok(())
    }

    fn paste(&mut self, text: &str) -> Result<(), TypingError> {
        if let Err(e) = self.clipboard.set_text(text) {
            tracing::warn!(error = %e, "clipboard unavailable, skipping paste");
            return Ok(());
        }
        self.input.settle(CHORD_AFTER_WRITE);

        self.input.send(&[SyntheticEvent::down(SyntheticKey::Control)])?;
        self.input.settle(CHORD_CTRL_DOWN);
        self.input.send(&[SyntheticEvent::down(SyntheticKey::V)])?;
        self.input.settle(CHORD_V_DOWN);
        self.input.send(&[SyntheticEvent::up(SyntheticKey::V)])?;
        self.input.settle(CHORD_V_UP);
        self.input.send(&[SyntheticEvent::up(SyntheticKey::Control)])
    }
}

fn encode_for(text: &str, encoding: OutputEncoding) -> Cow<'_, str> {
    match encoding {
        OutputEncoding::Unicode => Cow::Borrowed(text),
        other => Cow::Owned(codec::convert(text, Encoding::Unicode, other.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::INJECTION_MARKER;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Event(SyntheticEvent),
        Settle(Duration),
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<Step>,
        fail_after: Option<usize>,
    }

    impl Recorder {
        fn events(&self) -> Vec<SyntheticEvent> {
            self.steps
                .iter()
                .filter_map(|s| match s {
                    Step::Event(e) => Some(*e),
                    Step::Settle(_) => None,
                })
                .collect()
        }

        fn total_delay(&self) -> Duration {
            self.steps
                .iter()
                .filter_map(|s| match s {
                    Step::Settle(d) => Some(*d),
                    Step::Event(_) => None,
                })
                .sum()
        }
    }

    impl SyntheticInput for Recorder {
        fn send(&mut self, events: &[SyntheticEvent]) -> Result<(), TypingError> {
            if let Some(limit) = self.fail_after {
                if self.events().len() >= limit {
                    return Err(TypingError::Input("blocked".into()));
                }
            }
            self.steps.extend(events.iter().copied().map(Step::Event));
            Ok(())
        }

        fn settle(&mut self, delay: Duration) {
            self.steps.push(Step::Settle(delay));
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        writes: Vec<String>,
        broken: bool,
    }

    impl ClipboardWriter for FakeClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), TypingError> {
            if self.broken {
                return Err(TypingError::Clipboard("busy".into()));
            }
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    fn synth() -> TextSynthesizer<Recorder, FakeClipboard> {
        TextSynthesizer::new(Recorder::default(), FakeClipboard::default())
    }

    fn unit_pairs(text: &str) -> Vec<SyntheticEvent> {
        text.encode_utf16()
            .flat_map(|u| {
                [
                    SyntheticEvent::down(SyntheticKey::Unit(u)),
                    SyntheticEvent::up(SyntheticKey::Unit(u)),
                ]
            })
            .collect()
    }

    fn backspace_pairs(n: usize) -> Vec<SyntheticEvent> {
        (0..n)
            .flat_map(|_| {
                [
                    SyntheticEvent::down(SyntheticKey::Backspace),
                    SyntheticEvent::up(SyntheticKey::Backspace),
                ]
            })
            .collect()
    }

    #[test]
    fn test_fast_backspaces_then_units() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::new(3, "việt"),
            InjectionMode::Fast,
            OutputEncoding::Unicode,
        )
        .unwrap();

        let mut expected = backspace_pairs(3);
        expected.extend(unit_pairs("việt"));
        let events = s.input.events();
        assert_eq!(events, expected);
        assert!(events.iter().all(|e| e.marker == INJECTION_MARKER));
        assert!(s.clipboard.writes.is_empty());
    }

    #[test]
    fn test_slow_same_events_longer_delays() {
        let directive = ReplacementDirective::new(3, "việt");
        let mut fast = synth();
        let mut slow = synth();
        fast.send(&directive, InjectionMode::Fast, OutputEncoding::Unicode)
            .unwrap();
        slow.send(&directive, InjectionMode::Slow, OutputEncoding::Unicode)
            .unwrap();

        assert_eq!(fast.input.events(), slow.input.events());
        // 3 * (8 + 8) + 20 + 4 * 5
        assert_eq!(fast.input.total_delay(), Duration::from_millis(88));
        // 3 * (15 + 15) + 30 + 4 * 15
        assert_eq!(slow.input.total_delay(), Duration::from_millis(180));
    }

    #[test]
    fn test_clipboard_single_write_and_chord() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::new(0, "hà nội"),
            InjectionMode::Clipboard,
            OutputEncoding::Unicode,
        )
        .unwrap();

        assert_eq!(s.clipboard.writes, vec!["hà nội".to_string()]);
        assert_eq!(
            s.input.events(),
            vec![
                SyntheticEvent::down(SyntheticKey::Control),
                SyntheticEvent::down(SyntheticKey::V),
                SyntheticEvent::up(SyntheticKey::V),
                SyntheticEvent::up(SyntheticKey::Control),
            ]
        );
        assert_eq!(
            s.input.steps,
            vec![
                Step::Settle(CHORD_AFTER_WRITE),
                Step::Event(SyntheticEvent::down(SyntheticKey::Control)),
                Step::Settle(CHORD_CTRL_DOWN),
                Step::Event(SyntheticEvent::down(SyntheticKey::V)),
                Step::Settle(CHORD_V_DOWN),
                Step::Event(SyntheticEvent::up(SyntheticKey::V)),
                Step::Settle(CHORD_V_UP),
                Step::Event(SyntheticEvent::up(SyntheticKey::Control)),
            ]
        );
    }

    #[test]
    fn test_clipboard_empty_text_only_deletes() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::new(2, ""),
            InjectionMode::Clipboard,
            OutputEncoding::Unicode,
        )
        .unwrap();
        assert_eq!(s.input.events(), backspace_pairs(2));
        assert!(s.clipboard.writes.is_empty());
    }

    #[test]
    fn test_clipboard_failure_stops_after_deletes() {
        let mut s = TextSynthesizer::new(
            Recorder::default(),
            FakeClipboard {
                broken: true,
                ..Default::default()
            },
        );
        s.send(
            &ReplacementDirective::new(1, "ê"),
            InjectionMode::Clipboard,
            OutputEncoding::Unicode,
        )
        .unwrap();
        assert_eq!(s.input.events(), backspace_pairs(1));
    }

    #[test]
    fn test_vni_output_is_transliterated() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::new(0, "ệ"),
            InjectionMode::Fast,
            OutputEncoding::Vni,
        )
        .unwrap();
        assert_eq!(s.input.events(), unit_pairs("eä"));
    }

    #[test]
    fn test_high_surrogates_are_skipped() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::new(0, "a😀"),
            InjectionMode::Fast,
            OutputEncoding::Unicode,
        )
        .unwrap();
        let units: Vec<SyntheticKey> = s.input.events().iter().map(|e| e.key).collect();
        assert_eq!(
            units,
            vec![
                SyntheticKey::Unit(0x61),
                SyntheticKey::Unit(0x61),
                SyntheticKey::Unit(0xDE00),
                SyntheticKey::Unit(0xDE00),
            ]
        );
    }

    #[test]
    fn test_empty_directive_emits_nothing() {
        let mut s = synth();
        s.send(
            &ReplacementDirective::default(),
            InjectionMode::Slow,
            OutputEncoding::Tcvn3,
        )
        .unwrap();
        assert!(s.input.steps.is_empty());
    }

    #[test]
    fn test_backend_failure_stops_sequence() {
        let mut s = TextSynthesizer::new(
            Recorder {
                fail_after: Some(2),
                ..Default::default()
            },
            FakeClipboard::default(),
        );
        let result = s.send(
            &ReplacementDirective::new(3, "a"),
            InjectionMode::Fast,
            OutputEncoding::Unicode,
        );
        assert!(matches!(result, Err(TypingError::Input(_))));
        assert_eq!(s.input.events(), backspace_pairs(1));
    }
}
