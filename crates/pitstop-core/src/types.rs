// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the survey workflow.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Provider-assigned identifier for an outbound message (a Twilio SID in production).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

/// Survey language. Only English and Spanish are scripted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    Customer,
    #[serde(alias = "ai")]
    Assistant,
}

/// One utterance in a survey conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Ordered, append-only transcript of a survey.
///
/// Serialized as a bare JSON array of turns so the stored column stays
/// readable from SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// An empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation holding exactly one assistant turn.
    pub fn seeded(greeting: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push_assistant(greeting);
        conversation
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn push_customer(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Customer,
            text: text.into(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Assistant,
            text: text.into(),
        });
    }

    pub fn assistant_turns(&self) -> usize {
        self.count(Speaker::Assistant)
    }

    pub fn customer_turns(&self) -> usize {
        self.count(Speaker::Customer)
    }

    fn count(&self, speaker: Speaker) -> usize {
        self.turns.iter().filter(|t| t.speaker == speaker).count()
    }

    /// Flattens the turns to `speaker: text` lines joined by newlines.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A request to the generative backend.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    /// Model override; the provider's configured model is used when `None`.
    pub model: Option<String>,
    /// Optional system instruction sent separately from the prompt.
    pub system_prompt: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Output token cap override.
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// A single-prompt request with no overrides.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// A response from the generative backend.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Concatenated text of the first candidate.
    pub content: String,
    /// Model that produced the response.
    pub model: String,
    /// Finish reason reported by the backend, if any.
    pub finish_reason: Option<String>,
}

/// An outbound SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination phone number (E.164).
    pub to: String,
    /// Message body.
    pub body: String,
}
