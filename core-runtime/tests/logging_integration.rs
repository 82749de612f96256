//! Integration tests for the logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_builder() {
    // Only one global subscriber can be installed per process, so most of the
    // surface is exercised through the config builder.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_device_token_redaction() {
    assert_eq!(
        redact_if_sensitive("device_token", "d3adb33f-0000"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("api_key", "k"), "[REDACTED]");
}

#[test]
fn test_tag_values_pass_through() {
    assert_eq!(redact_if_sensitive("tag", "business"), "business");
    assert_eq!(redact_if_sensitive("source", "app"), "app");
}

#[test]
fn test_init_twice_fails() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    init_logging(config.clone()).expect("first init succeeds");
    assert!(init_logging(config).is_err());
}
