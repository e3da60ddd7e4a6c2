//! Sentinel tag carried by every synthetic event this process emits

/// Stored in `dwExtraInfo` (Windows) or the event-source user data (macOS).
///
/// The hook compares incoming events against this exact value, so input
/// injected by other tools (remote desktop, automation) is still treated as
/// real typing.
pub const INJECTION_MARKER: usize = 0x5649_4B45;

/// True when an event's extra-info field carries our marker
#[inline]
pub fn is_own_injection(extra_info: usize) -> bool {
    extra_info == INJECTION_MARKER
}
