// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: bind addresses, cron syntax,
//! survey window ordering and URL shapes.

use std::str::FromStr;

use croner::Cron;

use crate::diagnostic::ConfigError;
use crate::model::PitstopConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PitstopConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(validation("gateway.host must not be empty".to_string()));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation(
            "storage.database_path must not be empty".to_string(),
        ));
    }

    for (key, pattern) in [
        ("scheduler.survey_cron", &config.scheduler.survey_cron),
        ("scheduler.retry_cron", &config.scheduler.retry_cron),
    ] {
        if let Err(e) = Cron::from_str(pattern) {
            errors.push(validation(format!(
                "{key} `{pattern}` is not a valid cron pattern: {e}"
            )));
        }
    }

    if config.scheduler.window_start_hours >= config.scheduler.window_end_hours {
        errors.push(validation(format!(
            "scheduler.window_start_hours ({}) must be less than scheduler.window_end_hours ({})",
            config.scheduler.window_start_hours, config.scheduler.window_end_hours
        )));
    }

    if config.scheduler.retry_lookback_hours == 0 {
        errors.push(validation(
            "scheduler.retry_lookback_hours must be at least 1".to_string(),
        ));
    }

    for (key, value) in [
        ("sms.status_callback_url", &config.sms.status_callback_url),
        ("sms.public_base_url", &config.sms.public_base_url),
        ("sms.base_url", &config.sms.base_url),
        ("gemini.base_url", &config.gemini.base_url),
    ] {
        if let Some(url) = value
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            errors.push(validation(format!(
                "{key} `{url}` must start with http:// or https://"
            )));
        }
    }

    if let Some(phone) = &config.sms.from_number
        && !is_e164(phone)
    {
        errors.push(validation(format!(
            "sms.from_number `{phone}` must be in E.164 form, e.g. +15551234567"
        )));
    }

    if config.gemini.max_output_tokens == 0 {
        errors.push(validation(
            "gemini.max_output_tokens must be at least 1".to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

fn is_e164(phone: &str) -> bool {
    phone
        .strip_prefix('+')
        .is_some_and(|digits| (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = PitstopConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = PitstopConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn bad_cron_pattern_fails_validation() {
        let mut config = PitstopConfig::default();
        config.scheduler.survey_cron = "every morning".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "scheduler.survey_cron"));
    }

    #[test]
    fn inverted_window_fails_validation() {
        let mut config = PitstopConfig::default();
        config.scheduler.window_start_hours = 48;
        config.scheduler.window_end_hours = 24;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "window_start_hours"));
    }

    #[test]
    fn non_http_callback_url_fails_validation() {
        let mut config = PitstopConfig::default();
        config.sms.status_callback_url = Some("ftp://example.com/status".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "sms.status_callback_url"));
    }

    #[test]
    fn from_number_must_be_e164() {
        let mut config = PitstopConfig::default();
        config.sms.from_number = Some("555-1234".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "E.164"));

        config.sms.from_number = Some("+15551234567".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn errors_are_collected_not_short_circuited() {
        let mut config = PitstopConfig::default();
        config.storage.database_path = " ".to_string();
        config.gateway.host = "".to_string();
        config.scheduler.retry_cron = "nope".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = PitstopConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.storage.database_path = "/tmp/test.db".to_string();
        config.scheduler.survey_cron = "30 8 * * 1-5".to_string();
        config.sms.public_base_url = Some("https://surveys.example.com".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
