// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Pitstop configuration system.

use pitstop_config::diagnostic::ConfigError;
use pitstop_config::model::PitstopConfig;
use pitstop_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_pitstop_config() {
    let toml = r#"
[dealership]
name = "Fast Lane Auto"
log_level = "debug"

[gemini]
api_key = "g-123"
model = "gemini-1.5-flash"
max_output_tokens = 512

[sms]
account_sid = "AC123"
auth_token = "secret"
from_number = "+15550001111"
status_callback_url = "https://surveys.example.com/api/webhooks/twilio/status"
public_base_url = "https://surveys.example.com"
validate_signatures = false

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[gateway]
host = "0.0.0.0"
port = 8080
bearer_token = "dash-token"

[scheduler]
enabled = false
survey_cron = "0 10 * * *"
retry_cron = "*/30 * * * *"
max_retries = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.dealership.name, "Fast Lane Auto");
    assert_eq!(config.dealership.log_level, "debug");
    assert_eq!(config.gemini.api_key.as_deref(), Some("g-123"));
    assert_eq!(config.gemini.model, "gemini-1.5-flash");
    assert_eq!(config.gemini.max_output_tokens, 512);
    assert_eq!(config.sms.account_sid.as_deref(), Some("AC123"));
    assert_eq!(config.sms.from_number.as_deref(), Some("+15550001111"));
    assert!(!config.sms.validate_signatures);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("dash-token"));
    assert!(!config.scheduler.enabled);
    assert_eq!(config.scheduler.max_retries, 2);
    // Untouched keys keep their defaults.
    assert_eq!(config.scheduler.window_start_hours, 24);
    assert_eq!(config.scheduler.window_end_hours, 48);
}

#[test]
fn defaults_follow_survey_conventions() {
    let config = PitstopConfig::default();
    assert_eq!(config.dealership.name, "Premium Motors");
    assert_eq!(config.gemini.model, "gemini-pro");
    assert_eq!(config.scheduler.survey_cron, "0 9 * * *");
    assert_eq!(config.scheduler.max_retries, 3);
    assert!(config.sms.validate_signatures);
    assert!(config.gateway.bearer_token.is_none());
}

/// Unknown field in a section is rejected by deny_unknown_fields.
#[test]
fn unknown_field_in_sms_produces_error() {
    let toml = r#"
[sms]
auth_tokn = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("auth_tokn"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let toml = r#"
[scheduler]
max_retires = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_retires");
            assert_eq!(suggestion.as_deref(), Some("max_retries"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_top_level_section_rejected() {
    let toml = r#"
[telegram]
bot_token = "x"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_produces_invalid_type_diagnostic() {
    let toml = r#"
[gateway]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[scheduler]
survey_cron = "not a cron"
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("survey_cron"))
    ));
}

#[test]
fn empty_toml_gives_defaults() {
    let config = load_and_validate_str("").expect("empty config is valid");
    assert_eq!(config.gateway.port, 3000);
    assert!(config.storage.wal_mode);
}
