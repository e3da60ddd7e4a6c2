//! Dispatch counters for the keyboard hook

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct DispatchStats {
    seen: AtomicU64,
    own_injected: AtomicU64,
    reentrant: AtomicU64,
    forwarded: AtomicU64,
    swallowed: AtomicU64,
    resets: AtomicU64,
    engine_failures: AtomicU64,
    synth_failures: AtomicU64,
    toggles: AtomicU64,
    // Time spent inside forward-and-synthesize, for spotting slow engines
    busy_micros: AtomicU64,
    max_busy_micros: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Seen,
    OwnInjected,
    Reentrant,
    Forwarded,
    Swallowed,
    Reset,
    EngineFailure,
    SynthFailure,
    Toggle,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub seen: u64,
    pub own_injected: u64,
    pub reentrant: u64,
    pub forwarded: u64,
    pub swallowed: u64,
    pub resets: u64,
    pub engine_failures: u64,
    pub synth_failures: u64,
    pub toggles: u64,
    pub busy: Duration,
    pub max_busy: Duration,
}

impl DispatchStats {
    pub fn record(&self, kind: StatKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: StatKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    fn counter(&self, kind: StatKind) -> &AtomicU64 {
        match kind {
            StatKind::Seen => &self.seen,
            StatKind::OwnInjected => &self.own_injected,
            StatKind::Reentrant => &self.reentrant,
            StatKind::Forwarded => &self.forwarded,
            StatKind::Swallowed => &self.swallowed,
            StatKind::Reset => &self.resets,
            StatKind::EngineFailure => &self.engine_failures,
            StatKind::SynthFailure => &self.synth_failures,
            StatKind::Toggle => &self.toggles,
        }
    }

    fn record_busy(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.busy_micros.fetch_add(micros, Ordering::Relaxed);
        self.max_busy_micros.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            seen: self.get(StatKind::Seen),
            own_injected: self.get(StatKind::OwnInjected),
            reentrant: self.get(StatKind::Reentrant),
            forwarded: self.get(StatKind::Forwarded),
            swallowed: self.get(StatKind::Swallowed),
            resets: self.get(StatKind::Reset),
            engine_failures: self.get(StatKind::EngineFailure),
            synth_failures: self.get(StatKind::SynthFailure),
            toggles: self.get(StatKind::Toggle),
            busy: Duration::from_micros(self.busy_micros.load(Ordering::Relaxed)),
            max_busy: Duration::from_micros(self.max_busy_micros.load(Ordering::Relaxed)),
        }
    }

    pub fn summary(&self) -> String {
        let s = self.snapshot();
        if s.seen == 0 {
            return "No keys seen yet.".to_string();
        }
        let avg_ms = if s.forwarded > 0 {
            s.busy.as_secs_f64() * 1000.0 / s.forwarded as f64
        } else {
            0.0
        };
        format!(
            "Keys (n={}): forwarded={} swallowed={} own={} nested={} resets={} toggles={}\n\
             Failures: engine={} synth={}\n\
             Dispatch: avg={:.1}ms max={:.0}ms",
            s.seen,
            s.forwarded,
            s.swallowed,
            s.own_injected,
            s.reentrant,
            s.resets,
            s.toggles,
            s.engine_failures,
            s.synth_failures,
            avg_ms,
            s.max_busy.as_secs_f64() * 1000.0,
        )
    }
}

pub type SharedStats = Arc<DispatchStats>;

pub fn new_shared() -> SharedStats {
    Arc::new(DispatchStats::default())
}

/// Timer helper that records busy time on drop
pub struct Timer<'a> {
    start: Instant,
    stats: &'a DispatchStats,
}

impl<'a> Timer<'a> {
    pub fn new(stats: &'a DispatchStats) -> Self {
        Self {
            start: Instant::now(),
            stats,
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.stats.record_busy(self.start.elapsed());
    }
}

/// How long the hook has gone without delivering an event
///
/// Windows drops a low-level hook without notice when the callback overruns
/// `LowLevelHooksTimeout`; a long quiet period while the user is typing is
/// the only visible symptom.
#[derive(Debug, Clone, Copy)]
pub struct QuietWatch {
    last_seen: u64,
    changed_at: Instant,
}

impl QuietWatch {
    pub fn new(now: Instant) -> Self {
        Self {
            last_seen: 0,
            changed_at: now,
        }
    }

    /// Feed the current `Seen` count; returns the time since it last moved
    pub fn observe(&mut self, seen: u64, now: Instant) -> Duration {
        if seen != self.last_seen {
            self.last_seen = seen;
            self.changed_at = now;
        }
        now.saturating_duration_since(self.changed_at)
    }
}
