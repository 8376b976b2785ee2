//! Configuration for the configurator client
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/uconf/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod serialization;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_SECS: u64 = 30;
const DEFAULT_PRICE_CONCURRENCY: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the configurator backend
    pub api_url: String,

    /// Per-request timeout for backend calls
    pub request_timeout_secs: u64,

    /// How often the unread-notification count is polled while logged in
    pub poll_interval_secs: u64,

    /// Concurrent per-card price lookups
    pub price_concurrency: usize,

    /// Load test target; `BASE_URL` and `--base-url` override it
    pub loadtest_base_url: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_SECS,
            price_concurrency: DEFAULT_PRICE_CONCURRENCY,
            loadtest_base_url: None,
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub price_concurrency: Option<usize>,

    /// Optional [loadtest] section
    pub loadtest: Option<FileLoadTest>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileLoadTest {
    pub base_url: Option<String>,
}

/// Flat `[logging]` keys; the file writer is switched on by `file_enabled`
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// How often the JSON log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl LogRotation {
    /// Unrecognised names roll daily
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogRotation::Hourly => "hourly",
            LogRotation::Daily => "daily",
            LogRotation::Never => "never",
        }
    }
}

/// JSON log file output
#[derive(Debug, Clone, PartialEq)]
pub struct LogFile {
    pub dir: PathBuf,
    pub rotation: LogRotation,
    /// File name stem, e.g. "uconf" -> "uconf.2024-01-15"
    pub prefix: String,
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            rotation: LogRotation::Daily,
            prefix: "uconf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error; RUST_LOG wins
    pub level: String,
    /// `None` keeps logs in the TUI buffer or on stderr only
    pub file: Option<LogFile>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn from_section(section: FileLogging) -> Self {
        let defaults = LogFile::default();
        let file = section.file_enabled.unwrap_or(false).then(|| LogFile {
            dir: section.file_dir.map(PathBuf::from).unwrap_or(defaults.dir),
            rotation: section
                .file_rotation
                .as_deref()
                .map(LogRotation::from_name)
                .unwrap_or(defaults.rotation),
            prefix: section.file_prefix.unwrap_or(defaults.prefix),
        });
        Self {
            level: section.level.unwrap_or_else(|| "info".to_string()),
            file,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/uconf/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("uconf").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists.
    ///
    /// A config file that exists but can't be read or parsed is fatal: the
    /// process exits with a message instead of silently using defaults.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                    eprintln!("║  CONFIG ERROR - Failed to parse configuration file          ║");
                    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  Tip: Check for:\n");
                    eprintln!("    - Missing quotes around string values");
                    eprintln!("    - Numbers written as strings");
                    eprintln!("    - Typos in section names\n");
                    eprintln!("  To reset, run `uconf config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
                eprintln!("║  CONFIG ERROR - Cannot read configuration file              ║");
                eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // API URL: env > file > default
        let api_url = env("UCONF_API_URL")
            .filter(|v| !v.trim().is_empty())
            .or(file.api_url)
            .unwrap_or(defaults.api_url);

        // Poll interval: env > file > default; zero would spin
        let poll_interval_secs = env("UCONF_POLL_SECS")
            .and_then(|v| v.trim().parse().ok())
            .or(file.poll_interval_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.poll_interval_secs);

        let request_timeout_secs = file
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.request_timeout_secs);

        let price_concurrency = file
            .price_concurrency
            .filter(|n| *n > 0)
            .unwrap_or(defaults.price_concurrency);

        let loadtest_base_url = file.loadtest.and_then(|l| l.base_url);
        let logging = LoggingConfig::from_section(file.logging.unwrap_or_default());

        Self {
            api_url,
            request_timeout_secs,
            poll_interval_secs,
            price_concurrency,
            loadtest_base_url,
            logging,
        }
    }
}
