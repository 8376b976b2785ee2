//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// Escape a value for a TOML basic string
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> String {
        let loadtest_base_url = match &self.loadtest_base_url {
            Some(url) => format!("base_url = {}", quoted(url)),
            None => "# base_url = \"http://localhost:8080\"".to_string(),
        };
        let log_file = self.logging.file.clone().unwrap_or_default();

        format!(
            r#"# uconf configuration
# Environment variables override these values:
#   UCONF_API_URL    backend base URL
#   UCONF_POLL_SECS  notification poll interval
#   BASE_URL         load test target
#   RUST_LOG         log filter

# Configurator backend
api_url = {api_url}

# Per-request timeout (seconds)
request_timeout_secs = {timeout}

# Unread-notification poll interval while logged in (seconds)
poll_interval_secs = {poll}

# Concurrent per-card price lookups
price_concurrency = {concurrency}

[loadtest]
{loadtest_base_url}

[logging]
# trace, debug, info, warn, error
level = {level}
# JSON log files alongside the TUI buffer or stderr
file_enabled = {file_enabled}
file_dir = {file_dir}
# hourly, daily, never
file_rotation = {rotation}
file_prefix = {prefix}
"#,
            api_url = quoted(&self.api_url),
            timeout = self.request_timeout_secs,
            poll = self.poll_interval_secs,
            concurrency = self.price_concurrency,
            level = quoted(&self.logging.level),
            file_enabled = self.logging.file.is_some(),
            file_dir = quoted(&log_file.dir.display().to_string()),
            rotation = quoted(log_file.rotation.name()),
            prefix = quoted(&log_file.prefix),
        )
    }
}
