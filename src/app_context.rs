//! Which application has focus, and what encoding it expects
//!
//! Legacy Vietnamese fonts only render text in their own encoding, so the
//! output encoding is remembered per application (keyed by executable name).

use crate::codec::OutputEncoding;
use crate::config::SharedConfig;
use std::sync::Arc;

/// Foreground-app information consumed by the interceptor
pub trait AppContext: Send {
    /// Lowercase executable name of the focused app, if it can be determined
    fn foreground_app(&mut self) -> Option<String>;

    fn output_encoding(&self, app: Option<&str>) -> OutputEncoding;

    /// Apps where keys are never forwarded
    fn is_excluded(&self, app: Option<&str>) -> bool;
}

/// Identifies the process that owns input focus
pub trait ForegroundTracker: Send {
    fn foreground_app(&mut self) -> Option<String>;
}

/// Tracker for platforms without foreground lookup
#[derive(Debug, Default)]
pub struct NoForeground;

impl ForegroundTracker for NoForeground {
    fn foreground_app(&mut self) -> Option<String> {
        None
    }
}

/// Foreground tracking combined with the per-app settings in the config
pub struct ConfiguredAppContext<T> {
    tracker: T,
    config: Arc<SharedConfig>,
}

impl<T: ForegroundTracker> ConfiguredAppContext<T> {
    pub fn new(tracker: T, config: Arc<SharedConfig>) -> Self {
        Self { tracker, config }
    }
}

impl<T: ForegroundTracker> AppContext for ConfiguredAppContext<T> {
    fn foreground_app(&mut self) -> Option<String> {
        self.tracker.foreground_app()
    }

    fn output_encoding(&self, app: Option<&str>) -> OutputEncoding {
        self.config.read(|c| {
            app.and_then(|name| c.apps.encoding_for(name))
                .unwrap_or(c.default_encoding)
        })
    }

    fn is_excluded(&self, app: Option<&str>) -> bool {
        match app {
            Some(name) => self.config.read(|c| c.apps.is_excluded(name)),
            None => false,
        }
    }
}

/// The platform's default tracker
#[cfg(windows)]
pub fn system_tracker() -> WindowsForeground {
    WindowsForeground::default()
}

#[cfg(not(windows))]
pub fn system_tracker() -> NoForeground {
    NoForeground
}

#[cfg(windows)]
pub use windows_impl::WindowsForeground;

#[cfg(windows)]
mod windows_impl {
    use super::ForegroundTracker;
    use windows::Win32::Foundation::{CloseHandle, FALSE};
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_NAME_FORMAT, PROCESS_QUERY_LIMITED_INFORMATION,
        QueryFullProcessImageNameW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
    use windows::core::PWSTR;

    /// Foreground window → owning process → executable name
    ///
    /// The name is cached per process id, so the process is only opened when
    /// focus moves to a different app.
    #[derive(Debug, Default)]
    pub struct WindowsForeground {
        last: Option<(u32, Option<String>)>,
    }

    impl ForegroundTracker for WindowsForeground {
        fn foreground_app(&mut self) -> Option<String> {
            // SAFETY: plain Win32 queries; the out-pointer outlives the call.
            let pid = unsafe {
                let hwnd = GetForegroundWindow();
                if hwnd.0.is_null() {
                    return None;
                }
                let mut pid = 0u32;
                GetWindowThreadProcessId(hwnd, Some(&mut pid));
                pid
            };
            if pid == 0 {
                return None;
            }
            if let Some((cached, name)) = &self.last {
                if *cached == pid {
                    return name.clone();
                }
            }
            let name = exe_name(pid);
            self.last = Some((pid, name.clone()));
            name
        }
    }

    fn exe_name(pid: u32) -> Option<String> {
        // SAFETY: the handle is closed before returning; `buf` outlives the query.
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid).ok()?;
            let mut buf = [0u16; 260];
            let mut len = buf.len() as u32;
            let queried = QueryFullProcessImageNameW(
                handle,
                PROCESS_NAME_FORMAT(0),
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(handle);
            queried.ok()?;
            let path = String::from_utf16_lossy(&buf[..len as usize]);
            path.rsplit('\\').next().map(str::to_lowercase)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    struct Fixed(Option<&'static str>);

    impl ForegroundTracker for Fixed {
        fn foreground_app(&mut self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn context(app: Option<&'static str>) -> ConfiguredAppContext<Fixed> {
        let config = Config::parse(
            r#"
default_encoding = "unicode"
[apps]
excluded = ["mstsc.exe"]
[apps.encodings]
"winword.exe" = "vni"
"#,
        )
        .unwrap();
        ConfiguredAppContext::new(Fixed(app), Arc::new(SharedConfig::new(config)))
    }

    #[test]
    fn test_per_app_encoding() {
        let mut ctx = context(Some("winword.exe"));
        let app = ctx.foreground_app();
        assert_eq!(ctx.output_encoding(app.as_deref()), OutputEncoding::Vni);
        assert_eq!(ctx.output_encoding(Some("notepad.exe")), OutputEncoding::Unicode);
    }

    #[test]
    fn test_unknown_app_uses_default() {
        let mut ctx = context(None);
        assert_eq!(ctx.foreground_app(), None);
        assert_eq!(ctx.output_encoding(None), OutputEncoding::Unicode);
        assert!(!ctx.is_excluded(None));
    }

    #[test]
    fn test_excluded_apps() {
        let ctx = context(Some("mstsc.exe"));
        assert!(ctx.is_excluded(Some("mstsc.exe")));
        assert!(!ctx.is_excluded(Some("winword.exe")));
    }

    #[test]
    fn test_default_encoding_follows_config_changes() {
        let ctx = context(None);
        let mut changed = ctx.config.snapshot();
        changed.default_encoding = OutputEncoding::Tcvn3;
        ctx.config.replace(changed);
        assert_eq!(ctx.output_encoding(Some("notepad.exe")), OutputEncoding::Tcvn3);
    }
}
