// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::diagnostic::ConfigError;
use courier_config::model::{CourierConfig, OptimizationUi};
use courier_config::{load_and_validate_str, load_config_from_str};
use courier_core::types::VideoCompressionPreset;
use figment::Figment;
use figment::providers::{Format, Serialized, Toml};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[pipeline]
queued_background = true
optimization_ui = "never"

[optimization]
compress_images = false
video_preset = "low"

[limits]
fallback_max_upload_size = 52428800

[logging]
log_level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert!(config.pipeline.queued_background);
    assert_eq!(config.pipeline.optimization_ui, OptimizationUi::Never);
    assert!(!config.optimization.compress_images);
    assert_eq!(config.optimization.video_preset, VideoCompressionPreset::Low);
    assert_eq!(config.limits.fallback_max_upload_size, 52_428_800);
    assert_eq!(config.logging.log_level, "debug");
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    assert!(!config.pipeline.queued_background);
    assert_eq!(config.optimization.video_preset, VideoCompressionPreset::Standard);
    assert_eq!(config.limits.fallback_max_upload_size, 100 * 1024 * 1024);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[pipeline]\nqueued_backgrond = true\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "queued_backgrond");
            assert_eq!(suggestion.as_deref(), Some("queued_background"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telemetry]\nenabled = true\n")
        .expect_err("unknown section must fail");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn bad_preset_is_reported() {
    let errors = load_and_validate_str("[optimization]\nvideo_preset = \"ultra\"\n")
        .expect_err("unknown preset must fail");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("ultra"));
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[pipeline]\nqueued_background = \"yes\"\n")
        .expect_err("string for bool must fail");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_are_collected() {
    let toml = "[logging]\nlog_level = \"chatty\"\n[limits]\nfallback_max_upload_size = 0\n";
    let errors = load_and_validate_str(toml).expect_err("semantic errors");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Env overrides land on the same dotted keys the env provider maps to.
#[test]
fn dotted_overrides_take_precedence() {
    let config: CourierConfig = Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string("[pipeline]\nqueued_background = false\n"))
        .merge(("pipeline.queued_background", true))
        .merge(("optimization.video_preset", "high"))
        .extract()
        .expect("overrides extract");
    assert!(config.pipeline.queued_background);
    assert_eq!(config.optimization.video_preset, VideoCompressionPreset::High);
}
