//! Configuration tests

use super::*;
use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn parse(toml_str: &str) -> FileConfig {
    toml::from_str(toml_str).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );

    let reloaded = Config::from_sources(parsed.unwrap(), |_| None);
    assert_eq!(reloaded, config);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.api_url = "https://pc.example.com/api".to_string();
    config.poll_interval_secs = 5;
    config.loadtest_base_url = Some("http://staging:8080".to_string());
    config.logging.file = Some(LogFile {
        rotation: LogRotation::Hourly,
        ..LogFile::default()
    });
    config.logging.level = "debug".to_string();

    let reloaded = Config::from_sources(parse(&config.to_toml()), |_| None);
    assert_eq!(reloaded, config);
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_defaults_when_nothing_set() {
    let config = Config::from_sources(FileConfig::default(), |_| None);
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.poll_interval_secs, 30);
    assert_eq!(config.logging.level, "info");
    assert!(config.loadtest_base_url.is_none());
}

#[test]
fn test_file_overrides_defaults() {
    let file = parse(
        r#"
        api_url = "http://file:9000"
        poll_interval_secs = 12

        [logging]
        level = "warn"
        "#,
    );
    let config = Config::from_sources(file, |_| None);
    assert_eq!(config.api_url, "http://file:9000");
    assert_eq!(config.poll_interval_secs, 12);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_env_overrides_file() {
    let file = parse(
        r#"
        api_url = "http://file:9000"
        poll_interval_secs = 12
        "#,
    );
    let env = env_from(&[
        ("UCONF_API_URL", "http://env:7000"),
        ("UCONF_POLL_SECS", "3"),
    ]);
    let config = Config::from_sources(file, env);
    assert_eq!(config.api_url, "http://env:7000");
    assert_eq!(config.poll_interval_secs, 3);
}

#[test]
fn test_invalid_env_values_fall_through() {
    let file = parse("poll_interval_secs = 12");
    let env = env_from(&[("UCONF_API_URL", "  "), ("UCONF_POLL_SECS", "soon")]);
    let config = Config::from_sources(file, env);
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.poll_interval_secs, 12);
}

#[test]
fn test_zero_intervals_rejected() {
    let file = parse(
        r#"
        poll_interval_secs = 0
        request_timeout_secs = 0
        price_concurrency = 0
        "#,
    );
    let config = Config::from_sources(file, |_| None);
    assert_eq!(config, Config::default());
}

#[test]
fn test_unknown_rotation_defaults_to_daily() {
    let file = parse(
        r#"
        [logging]
        file_enabled = true
        file_rotation = "weekly"
        "#,
    );
    let config = Config::from_sources(file, |_| None);
    let log_file = config.logging.file.unwrap();
    assert_eq!(log_file.rotation, LogRotation::Daily);
    assert_eq!(log_file.prefix, "uconf");
}

#[test]
fn test_file_logging_off_unless_enabled() {
    let file = parse(
        r#"
        [logging]
        file_rotation = "hourly"
        "#,
    );
    let config = Config::from_sources(file, |_| None);
    assert!(config.logging.file.is_none());
}

#[test]
fn test_template_escapes_quotes() {
    let mut config = Config::default();
    config.logging.file_dir = PathBuf::from(r#"C:\logs\"odd""#);
    let reloaded = Config::from_sources(parse(&config.to_toml()), |_| None);
    assert_eq!(reloaded.logging.file_dir, config.logging.file_dir);
}
