// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Pitstop.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Pitstop configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PitstopConfig {
    /// Dealership identity and survey wording.
    #[serde(default)]
    pub dealership: DealershipConfig,

    /// Google Gemini settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Twilio SMS settings.
    #[serde(default)]
    pub sms: SmsConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Survey and retry job schedules.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Dealership identity and survey wording.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DealershipConfig {
    /// Dealership name used in the greeting.
    #[serde(default = "default_dealership_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Replaces the built-in instruction sent with the extraction prompt.
    #[serde(default)]
    pub survey_prompt: Option<String>,
}

impl Default for DealershipConfig {
    fn default() -> Self {
        Self {
            name: default_dealership_name(),
            log_level: default_log_level(),
            survey_prompt: None,
        }
    }
}

fn default_dealership_name() -> String {
    "Premium Motors".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Google Gemini configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` requires `GEMINI_API_KEY` or `GOOGLE_AI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for every call.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Output token cap per call.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            max_output_tokens: default_max_output_tokens(),
            base_url: None,
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

fn default_max_output_tokens() -> u32 {
    1024
}

/// Twilio SMS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsConfig {
    /// Account SID. `None` requires `TWILIO_ACCOUNT_SID`.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Auth token. `None` requires `TWILIO_AUTH_TOKEN`.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sending number in E.164 form. `None` requires `TWILIO_PHONE_NUMBER`.
    #[serde(default)]
    pub from_number: Option<String>,

    /// Delivery-report URL passed with every send.
    #[serde(default)]
    pub status_callback_url: Option<String>,

    /// Externally visible base URL of the gateway, used to verify webhook signatures.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Reject webhooks whose `X-Twilio-Signature` does not verify.
    #[serde(default = "default_validate_signatures")]
    pub validate_signatures: bool,

    /// API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            status_callback_url: None,
            public_base_url: None,
            validate_signatures: default_validate_signatures(),
            base_url: None,
        }
    }
}

fn default_validate_signatures() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pitstop").join("pitstop.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pitstop.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the dashboard API. `None` rejects every dashboard request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Survey and retry job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run both jobs inside `pitstop serve`.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Cron pattern for sending first survey messages.
    #[serde(default = "default_survey_cron")]
    pub survey_cron: String,

    /// Cron pattern for resending failed messages.
    #[serde(default = "default_retry_cron")]
    pub retry_cron: String,

    /// Maximum resends per message.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Visits must have completed at least this many hours ago.
    #[serde(default = "default_window_start_hours")]
    pub window_start_hours: u32,

    /// Visits must have completed at most this many hours ago.
    #[serde(default = "default_window_end_hours")]
    pub window_end_hours: u32,

    /// How far back the retry job looks for failed sends.
    #[serde(default = "default_retry_lookback_hours")]
    pub retry_lookback_hours: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            survey_cron: default_survey_cron(),
            retry_cron: default_retry_cron(),
            max_retries: default_max_retries(),
            window_start_hours: default_window_start_hours(),
            window_end_hours: default_window_end_hours(),
            retry_lookback_hours: default_retry_lookback_hours(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_survey_cron() -> String {
    "0 9 * * *".to_string()
}

fn default_retry_cron() -> String {
    "0 * * * *".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_window_start_hours() -> u32 {
    24
}

fn default_window_end_hours() -> u32 {
    48
}

fn default_retry_lookback_hours() -> u32 {
    24
}
