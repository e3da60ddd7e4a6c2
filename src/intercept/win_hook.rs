//! `WH_KEYBOARD_LL` hook
//!
//! The callback runs on the thread that installed the hook, inside that
//! thread's message loop. It looks up the active dispatcher and delegates.

use super::{Dispatcher, Modifiers, RawKeyEvent, Verdict};
use crate::config::SharedConfig;
use crate::stats::{DispatchStats, QuietWatch};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicIsize, Ordering::SeqCst};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, VIRTUAL_KEY, VK_CAPITAL, VK_CONTROL, VK_LWIN, VK_MENU,
    VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, KillTimer,
    MB_ICONERROR, MB_OK, MSG, MessageBoxW, PostThreadMessageW, SetTimer, SetWindowsHookExW,
    TranslateMessage, UnhookWindowsHookEx, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT, WM_SYSKEYDOWN,
    WM_TIMER,
};
use windows::core::{PCWSTR, w};

static ACTIVE: Mutex<Option<Arc<Dispatcher>>> = Mutex::new(None);
static HOOK: AtomicIsize = AtomicIsize::new(0);

#[derive(Debug)]
pub enum HookError {
    /// Only one hook may exist per process
    AlreadyInstalled,
    Install(windows::core::Error),
    MessageLoop(windows::core::Error),
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::AlreadyInstalled => write!(f, "Keyboard hook already installed"),
            HookError::Install(e) => write!(f, "Failed to install keyboard hook: {}", e),
            HookError::MessageLoop(e) => write!(f, "Message loop failed: {}", e),
        }
    }
}

impl std::error::Error for HookError {}

/// Keeps the hook registered; unhooks and clears the dispatcher on drop
pub struct HookHandle {
    thread_id: u32,
}

impl HookHandle {
    /// Thread that owns the hook and must pump messages
    pub fn thread_id(&self) -> u32 {
        self.thread_id
    }
}

impl Drop for HookHandle {
    fn drop(&mut self) {
        let hook = HOOK.swap(0, SeqCst);
        if hook != 0 {
            // SAFETY: `hook` came from SetWindowsHookExW and is unhooked once.
            if let Err(e) = unsafe { UnhookWindowsHookEx(HHOOK(hook as *mut _)) } {
                warn!(error = %e, "failed to remove keyboard hook");
            }
        }
        ACTIVE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        info!("keyboard hook removed");
    }
}

/// Register the process-wide hook, routing key-downs to `dispatcher`
///
/// Must be called on the thread that will run [`run_message_loop`].
pub fn install(dispatcher: Arc<Dispatcher>) -> Result<HookHandle, HookError> {
    {
        let mut active = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
        if active.is_some() {
            return Err(HookError::AlreadyInstalled);
        }
        *active = Some(dispatcher);
    }

    // SAFETY: `keyboard_proc` matches HOOKPROC and lives for the whole program.
    let hook = unsafe {
        GetModuleHandleW(PCWSTR::null()).and_then(|module| {
            SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(keyboard_proc),
                HINSTANCE::from(module),
                0,
            )
        })
    };

    match hook {
        Ok(hook) => {
            HOOK.store(hook.0 as isize, SeqCst);
            // SAFETY: no preconditions.
            let thread_id = unsafe { GetCurrentThreadId() };
            info!("keyboard hook installed");
            Ok(HookHandle { thread_id })
        }
        Err(e) => {
            ACTIVE
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            error!(error = %e, "failed to install keyboard hook");
            // SAFETY: static wide strings.
            unsafe {
                MessageBoxW(
                    None,
                    w!("Failed to install keyboard hook!"),
                    w!("vikey"),
                    MB_OK | MB_ICONERROR,
                );
            }
            Err(HookError::Install(e))
        }
    }
}

fn active_dispatcher() -> Option<Arc<Dispatcher>> {
    ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let hook = HHOOK(HOOK.load(SeqCst) as *mut _);

    let key_down = matches!(wparam.0 as u32, WM_KEYDOWN | WM_SYSKEYDOWN);
    if code == HC_ACTION as i32 && key_down {
        // SAFETY: for HC_ACTION, lparam points at a KBDLLHOOKSTRUCT.
        let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
        if let Some(dispatcher) = active_dispatcher() {
            let event = RawKeyEvent {
                vk: info.vkCode,
                extra_info: info.dwExtraInfo,
                modifiers: read_modifiers(),
            };
            // Unwinding across the FFI boundary would abort the process
            let verdict = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(&event)))
                .unwrap_or(Verdict::PassThrough);
            if verdict == Verdict::Swallow {
                return LRESULT(1);
            }
        }
    }

    // SAFETY: forwarding the arguments we were given.
    unsafe { CallNextHookEx(hook, code, wparam, lparam) }
}

fn read_modifiers() -> Modifiers {
    Modifiers {
        shift: is_down(VK_SHIFT),
        ctrl: is_down(VK_CONTROL),
        alt: is_down(VK_MENU),
        win: is_down(VK_LWIN) || is_down(VK_RWIN),
        // SAFETY: no preconditions.
        caps_lock: unsafe { GetKeyState(VK_CAPITAL.0 as i32) } & 1 != 0,
    }
}

fn is_down(key: VIRTUAL_KEY) -> bool {
    // SAFETY: no preconditions; a failed query reads as "not pressed".
    unsafe { GetAsyncKeyState(key.0 as i32) < 0 }
}

/// Pump messages until WM_QUIT, running the health check every `interval`
pub fn run_message_loop(
    config: &SharedConfig,
    stats: &DispatchStats,
    interval: Duration,
) -> Result<(), HookError> {
    let millis = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX).max(100);
    // SAFETY: thread timer with no callback; it posts WM_TIMER to this thread.
    let timer = unsafe { SetTimer(None, 0, millis, None) };
    if timer == 0 {
        warn!("failed to start health timer");
    }

    let mut quiet = QuietWatch::new(Instant::now());
    let mut msg = MSG::default();
    let result = loop {
        // SAFETY: `msg` is a valid out-pointer for the whole loop.
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match status.0 {
            0 => break Ok(()),
            -1 => break Err(HookError::MessageLoop(windows::core::Error::from_win32())),
            _ => {}
        }
        if msg.message == WM_TIMER && timer != 0 && msg.wParam.0 == timer {
            health_check(config, stats, &mut quiet);
            continue;
        }
        // SAFETY: `msg` was filled by GetMessageW.
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    };

    if timer != 0 {
        // SAFETY: `timer` is the id SetTimer returned on this thread.
        let _ = unsafe { KillTimer(None, timer) };
    }
    result
}

fn health_check(config: &SharedConfig, stats: &DispatchStats, quiet: &mut QuietWatch) {
    let snap = stats.snapshot();
    let quiet_for = quiet.observe(snap.seen, Instant::now());
    debug!(
        quiet_secs = quiet_for.as_secs(),
        max_busy_ms = snap.max_busy.as_millis() as u64,
        seen = snap.seen,
        forwarded = snap.forwarded,
        swallowed = snap.swallowed,
        "hook health"
    );
    match config.reload_if_changed() {
        Ok(true) => info!("config reloaded"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "config reload failed, keeping previous"),
    }
}

/// Ask the hook thread's message loop to exit; safe from any thread
pub fn request_quit(thread_id: u32) {
    // SAFETY: posting a parameterless message.
    if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
        warn!(error = %e, "failed to stop message loop");
    }
}
