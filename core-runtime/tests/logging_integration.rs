//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_initialization() {
    // Logging can only be initialized once per process, so only the config builder is checked
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_redaction_of_decryption_fields() {
    assert_eq!(
        redact_if_sensitive("crypto_session", "0a1b2c3d"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("session_key", "ff00"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("license_url", "https://"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
}

#[test]
fn test_redaction_passes_normal_values() {
    assert_eq!(redact_if_sensitive("codec", "h264"), "h264");
    assert_eq!(redact_if_sensitive("width", "1920"), "1920");
    assert_eq!(redact_if_sensitive("provider", "malloc"), "malloc");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[cfg(not(debug_assertions))]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Json);
    }
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_decode=trace,core_service=debug");

    assert_eq!(
        config.filter,
        Some("core_decode=trace,core_service=debug".to_string())
    );
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
