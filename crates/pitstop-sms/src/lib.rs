// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio SMS channel adapter for Pitstop.
//!
//! Sends survey messages through the Twilio Messages API and verifies the
//! signatures on Twilio's inbound and status webhooks. Inbound handling
//! itself lives in the gateway; this crate only provides the payload types.

pub mod signature;
pub mod types;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use pitstop_config::model::SmsConfig;
use pitstop_core::error::PitstopError;
use pitstop_core::traits::{ChannelAdapter, PluginAdapter};
use pitstop_core::types::{AdapterType, HealthStatus, MessageId, OutboundMessage};
use tracing::{debug, info, warn};

use crate::types::{ApiErrorResponse, MessageResource, SendMessageForm};

/// Public Twilio REST host.
pub const API_BASE_URL: &str = "https://api.twilio.com";

/// Account credentials, from config or `TWILIO_*` environment variables.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

impl TwilioCredentials {
    /// Resolves each credential from config, falling back to its environment variable.
    pub fn resolve(config: &SmsConfig) -> Result<Self, PitstopError> {
        Ok(Self {
            account_sid: resolve(&config.account_sid, "TWILIO_ACCOUNT_SID", "sms.account_sid")?,
            auth_token: resolve(&config.auth_token, "TWILIO_AUTH_TOKEN", "sms.auth_token")?,
            from_number: resolve(&config.from_number, "TWILIO_PHONE_NUMBER", "sms.from_number")?,
        })
    }
}

fn resolve(value: &Option<String>, env_var: &str, key: &str) -> Result<String, PitstopError> {
    if let Some(v) = value
        && !v.is_empty()
    {
        return Ok(v.clone());
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            PitstopError::Config(format!(
                "Twilio credential missing. Set {key} in config or the {env_var} environment variable."
            ))
        })
}

/// SMS channel backed by the Twilio Messages API.
pub struct TwilioChannel {
    client: reqwest::Client,
    credentials: TwilioCredentials,
    status_callback_url: Option<String>,
    base_url: String,
    max_retries: u32,
}

impl TwilioChannel {
    /// Creates a channel from the `[sms]` config section.
    pub fn new(config: &SmsConfig) -> Result<Self, PitstopError> {
        let credentials = TwilioCredentials::resolve(config)?;
        let channel = Self::with_credentials(
            credentials,
            config.status_callback_url.clone(),
            config.base_url.clone(),
        )?;
        info!(from = %channel.credentials.from_number, "Twilio channel initialized");
        Ok(channel)
    }

    /// Creates a channel from already-resolved credentials.
    pub fn with_credentials(
        credentials: TwilioCredentials,
        status_callback_url: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, PitstopError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PitstopError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            credentials,
            status_callback_url,
            base_url: base_url
                .unwrap_or_else(|| API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_retries: 1,
        })
    }

    /// The number surveys are sent from.
    pub fn from_number(&self) -> &str {
        &self.credentials.from_number
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }
}

#[async_trait]
impl PluginAdapter for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PitstopError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PitstopError> {
        debug!("Twilio channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TwilioChannel {
    /// Sends one SMS. Retries once on 429/500/503.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PitstopError> {
        let url = self.messages_url();
        let form = SendMessageForm {
            to: &msg.to,
            from: &self.credentials.from_number,
            body: &msg.body,
            status_callback: self.status_callback_url.as_deref(),
        };

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, to = %msg.to, "retrying SMS send after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
                .form(&form)
                .send()
                .await
                .map_err(|e| PitstopError::Channel {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "Twilio response received");

            if status.is_success() {
                let resource: MessageResource =
                    response.json().await.map_err(|e| PitstopError::Channel {
                        message: format!("failed to parse Twilio response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                debug!(sid = %resource.sid, status = ?resource.status, "SMS accepted");
                return Ok(MessageId(resource.sid));
            }

            let body = response.text().await.unwrap_or_default();
            if matches!(status.as_u16(), 429 | 500 | 503) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PitstopError::Channel {
                    message: format!("Twilio returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => match api_err.code {
                    Some(code) => format!("Twilio error {code}: {}", api_err.message),
                    None => format!("Twilio error: {}", api_err.message),
                },
                Err(_) => format!("Twilio returned {status}: {body}"),
            };
            return Err(PitstopError::Channel {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| PitstopError::Channel {
            message: "SMS send failed after retries".into(),
            source: None,
        }))
    }
}
