// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine: one inbound message in, one decision out.
//!
//! The engine is stateless. Each call to [`ConversationEngine::advance`]
//! takes the stored conversation, appends the customer's reply, derives the
//! phase from turn counts and either picks the next question or runs
//! extraction. Persistence and sending are the caller's job.

use std::sync::Arc;

use pitstop_core::types::ProviderRequest;
use pitstop_core::{Conversation, Language, PitstopError, ProviderAdapter};
use tracing::{debug, warn};

use crate::extraction::{SurveyExtractor, SurveyResult};
use crate::language::LanguageDetector;
use crate::phase::{SurveyPhase, phase_of};
use crate::scripts;

/// What the caller should do after a turn.
#[derive(Debug)]
pub enum TurnAction {
    /// Send this text. It is already appended to the conversation.
    Reply(String),
    /// The survey reached its terminal phase; extraction ran.
    Extracted(Result<SurveyResult, PitstopError>),
}

/// Result of advancing a conversation by one customer message.
#[derive(Debug)]
pub struct TurnOutcome {
    pub conversation: Conversation,
    /// Language detected from the inbound text.
    pub language: Language,
    /// Phase computed after the customer turn was appended.
    pub phase: SurveyPhase,
    pub action: TurnAction,
}

impl TurnOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self.action, TurnAction::Extracted(_))
    }

    pub fn outbound_text(&self) -> Option<&str> {
        match &self.action {
            TurnAction::Reply(text) => Some(text),
            TurnAction::Extracted(_) => None,
        }
    }
}

/// Drives the survey script.
#[derive(Clone)]
pub struct ConversationEngine {
    provider: Arc<dyn ProviderAdapter>,
    detector: LanguageDetector,
    extractor: SurveyExtractor,
    dealership: String,
}

impl ConversationEngine {
    /// `survey_instruction` replaces the built-in extraction instruction.
    /// Free-form replies always use [`scripts::conversation_instruction`].
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        dealership: impl Into<String>,
        survey_instruction: Option<String>,
    ) -> Self {
        Self {
            detector: LanguageDetector::new(provider.clone()),
            extractor: SurveyExtractor::new(provider.clone(), survey_instruction),
            provider,
            dealership: dealership.into(),
        }
    }

    /// A fresh conversation holding only the greeting.
    pub fn seed(&self, language: Language) -> Conversation {
        Conversation::seeded(self.greeting(language))
    }

    pub fn greeting(&self, language: Language) -> String {
        scripts::greeting(language, &self.dealership)
    }

    /// Advances `prior` by one customer message.
    ///
    /// A missing or empty conversation is seeded with the greeting in
    /// `seed_language` first.
    pub async fn advance(
        &self,
        inbound: &str,
        prior: Option<Conversation>,
        seed_language: Language,
    ) -> TurnOutcome {
        let mut conversation = prior
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.seed(seed_language));
        conversation.push_customer(inbound);

        let language = self.detector.detect(inbound).await;
        let phase = phase_of(&conversation);
        debug!(%phase, %language, turns = conversation.len(), "conversation advanced");

        if phase.is_terminal() {
            let result = self.extractor.extract(&conversation.transcript()).await;
            return TurnOutcome {
                conversation,
                language,
                phase,
                action: TurnAction::Extracted(result),
            };
        }

        let reply = match scripts::question_after(phase, language) {
            Some(question) => question.to_string(),
            None => self.free_form(&conversation, language).await,
        };
        conversation.push_assistant(reply.clone());

        TurnOutcome {
            conversation,
            language,
            phase,
            action: TurnAction::Reply(reply),
        }
    }

    async fn free_form(&self, conversation: &Conversation, language: Language) -> String {
        let prompt = format!(
            "{}\n\nConversation so far:\n{}\n\nPlease respond in {language} to continue the survey.",
            scripts::conversation_instruction(&self.dealership),
            conversation.transcript()
        );
        match self.provider.complete(ProviderRequest::prompt(prompt)).await {
            Ok(response) if !response.content.trim().is_empty() => {
                response.content.trim().to_string()
            }
            Ok(_) => {
                warn!("free-form generation returned empty text, sending apology");
                scripts::apology(language).to_string()
            }
            Err(e) => {
                warn!(error = %e, "free-form generation failed, sending apology");
                scripts::apology(language).to_string()
            }
        }
    }
}
