// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! English/Spanish detection through the generative backend.

use std::sync::Arc;

use pitstop_core::types::ProviderRequest;
use pitstop_core::{Language, ProviderAdapter};
use tracing::{debug, warn};

/// Classifies customer replies as English or Spanish. Never fails.
#[derive(Clone)]
pub struct LanguageDetector {
    provider: Arc<dyn ProviderAdapter>,
}

impl LanguageDetector {
    pub fn new(provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { provider }
    }

    /// Detects the language of `text`, falling back to English on any error.
    pub async fn detect(&self, text: &str) -> Language {
        let request = ProviderRequest {
            max_tokens: Some(16),
            ..ProviderRequest::prompt(detection_prompt(text))
        };
        match self.provider.complete(request).await {
            Ok(response) => {
                let language = parse_detection_reply(&response.content);
                debug!(%language, "language detected");
                language
            }
            Err(e) => {
                warn!(error = %e, "language detection failed, assuming English");
                Language::English
            }
        }
    }
}

fn detection_prompt(text: &str) -> String {
    format!(
        "Determine if the following text is in English or Spanish. \
         Only respond with \"English\" or \"Spanish\".\n\nText: \"{text}\""
    )
}

/// Any mention of Spanish wins; everything else, including an empty reply, is English.
pub fn parse_detection_reply(reply: &str) -> Language {
    if reply.contains("Spanish") || reply.contains("Español") {
        Language::Spanish
    } else {
        Language::English
    }
}
