// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Pitstop.
//!
//! This crate implements [`ProviderAdapter`] over the Gemini
//! `generateContent` endpoint. Each call is a single-shot text completion;
//! the survey workflow builds the full prompt (system text plus transcript)
//! itself.

pub mod client;
pub mod types;

use async_trait::async_trait;
use pitstop_config::model::GeminiConfig;
use pitstop_core::error::PitstopError;
use pitstop_core::traits::{PluginAdapter, ProviderAdapter};
use pitstop_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig};

/// Environment variables consulted, in order, when no key is configured.
const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// Gemini provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `GEMINI_API_KEY` -> `GOOGLE_AI_API_KEY` -> error.
pub struct GeminiProvider {
    client: GeminiClient,
    max_output_tokens: u32,
}

impl GeminiProvider {
    /// Creates a provider from the `[gemini]` config section.
    pub fn new(config: &GeminiConfig) -> Result<Self, PitstopError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(api_key, config.model.clone(), config.base_url.clone())?;
        info!(model = config.model, "Gemini provider initialized");
        Ok(Self {
            client,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// Creates a provider with an existing client (for testing).
    pub fn with_client(client: GeminiClient, max_output_tokens: u32) -> Self {
        Self {
            client,
            max_output_tokens,
        }
    }

    fn to_api_request(&self, request: &ProviderRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), request.prompt.clone())],
            system_instruction: request
                .system_prompt
                .as_ref()
                .map(|s| Content::text(None, s.clone())),
            generation_config: Some(GenerationConfig {
                max_output_tokens: request.max_tokens.unwrap_or(self.max_output_tokens),
            }),
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PitstopError> {
        // No live request here: every Gemini call is billed.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PitstopError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PitstopError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.client.default_model().to_string());
        let api_request = self.to_api_request(&request);
        let response = self.client.generate_content(&model, &api_request).await?;

        let content = response.first_text().ok_or_else(|| PitstopError::Provider {
            message: "Gemini returned no candidates".into(),
            source: None,
        })?;

        Ok(ProviderResponse {
            content,
            finish_reason: response.finish_reason(),
            model: response.model_version.unwrap_or(model),
        })
    }
}

/// Resolves the API key: config value first, then the environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, PitstopError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    API_KEY_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .ok_or_else(|| {
            PitstopError::Config(
                "Gemini API key not found. Set gemini.api_key in config or the GEMINI_API_KEY environment variable.".into(),
            )
        })
}
