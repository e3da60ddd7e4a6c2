use crate::codec::OutputEncoding;
use crate::intercept::HotkeyConfig;
use crate::typing::InjectionMode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::SystemTime;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Whether Vietnamese input starts switched on
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub injection_mode: InjectionMode,
    /// Output encoding for apps without an entry in `apps.encodings`
    #[serde(default)]
    pub default_encoding: OutputEncoding,
    #[serde(default)]
    pub toggle_hotkey: HotkeyConfig,
    #[serde(default)]
    pub apps: AppsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub hook: HookConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            injection_mode: InjectionMode::default(),
            default_encoding: OutputEncoding::default(),
            toggle_hotkey: HotkeyConfig::default(),
            apps: AppsConfig::default(),
            logging: LoggingConfig::default(),
            hook: HookConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

// ============================================================================
// Per-app Config
// ============================================================================

/// Keyed by executable file name ("winword.exe"), case-insensitive
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct AppsConfig {
    /// Apps where keys are never forwarded (games, remote-desktop clients)
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Output encoding remembered per app
    #[serde(default)]
    pub encodings: HashMap<String, OutputEncoding>,
    /// Remember whether Vietnamese input was on or off in each app and
    /// restore it when that app comes back to the foreground
    #[serde(default)]
    pub smart_switch: bool,
}

impl AppsConfig {
    fn normalize(&mut self) {
        for name in &mut self.excluded {
            *name = name.trim().to_lowercase();
        }
        self.encodings = self
            .encodings
            .drain()
            .map(|(name, enc)| (name.trim().to_lowercase(), enc))
            .collect();
    }

    /// `app` must already be lowercase
    pub fn is_excluded(&self, app: &str) -> bool {
        self.excluded.iter().any(|name| name == app)
    }

    pub fn encoding_for(&self, app: &str) -> Option<OutputEncoding> {
        self.encodings.get(app).copied()
    }
}

// ============================================================================
// Logging Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "vikey=debug"; `VIKEY_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write JSON lines here instead of plain text to stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

// ============================================================================
// Hook Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HookConfig {
    /// Interval of the hook health check and config reload
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            health_interval_secs: default_health_interval(),
        }
    }
}

fn default_health_interval() -> u64 {
    3
}

// ============================================================================
// Loading
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Invalid config {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
        }
    }
}

impl Config {
    /// Like `load_from`, but logs the error and falls back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default config");
                Config::default()
            }
        }
    }

    /// A missing file yields the defaults; an unreadable or invalid one is an error
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(text)?;
        config.apps.normalize();
        Ok(config)
    }
}

/// Config shared between the hook and its health timer
///
/// Readers always see the latest successfully loaded file; a reload that
/// fails keeps the previous config.
#[derive(Debug)]
pub struct SharedConfig {
    path: Option<PathBuf>,
    current: RwLock<Config>,
    modified: Mutex<Option<SystemTime>>,
}

impl SharedConfig {
    /// In-memory config with no backing file
    pub fn new(config: Config) -> Self {
        Self {
            path: None,
            current: RwLock::new(config),
            modified: Mutex::new(None),
        }
    }

    /// Load `path`, falling back to defaults, and watch it for changes
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = Config::load_or_default(&path);
        Self::watching(config, path)
    }

    /// Start from an already loaded `config` and watch `path` for changes
    pub fn watching(config: Config, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            modified: Mutex::new(modified_time(&path)),
            path: Some(path),
            current: RwLock::new(config),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Config) -> R) -> R {
        let config = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&config)
    }

    pub fn snapshot(&self) -> Config {
        self.read(Config::clone)
    }

    pub fn injection_mode(&self) -> InjectionMode {
        self.read(|c| c.injection_mode)
    }

    pub fn replace(&self, config: Config) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Reload when the file's modification time moved; Ok(true) if reloaded
    pub fn reload_if_changed(&self) -> Result<bool, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(false);
        };
        let Some(stamp) = modified_time(path) else {
            return Ok(false);
        };
        {
            let mut last = self.modified.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == Some(stamp) {
                return Ok(false);
            }
            // Recorded before parsing so a broken file is reported once per edit
            *last = Some(stamp);
        }
        let config = Config::load_from(path)?;
        self.replace(config);
        Ok(true)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
