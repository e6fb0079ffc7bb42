// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the generative-language backend.

use async_trait::async_trait;

use crate::error::PitstopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for a generative-language backend.
///
/// Language detection, free-form replies and survey extraction all go
/// through the single `complete` call.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PitstopError>;
}
