// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Survey orchestration over the store, the SMS channel and the engine.
//!
//! [`SurveyService`] is what the webhooks and scheduled jobs call. Inbound
//! turns for the same service visit run one at a time behind a per-visit
//! async mutex; turns for different visits run concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use pitstop_config::model::PitstopConfig;
use pitstop_core::records::{
    Customer, MessageDirection, MessageLog, NewMessageLog, ServiceVisit, Survey, message_status,
};
use pitstop_core::types::OutboundMessage;
use pitstop_core::{ChannelAdapter, MessageId, PitstopError, ProviderAdapter, StorageAdapter};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::commit::{CommitReport, commit_survey_result};
use crate::engine::{ConversationEngine, TurnAction};
use crate::phase::SurveyPhase;
use crate::scripts;

/// `message_step` recorded for the closing message.
pub const THANK_YOU_STEP: &str = "thank_you";

/// Why an inbound message produced no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownSender,
    NoServiceVisit,
    SurveyCompleted,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    Ignored(IgnoreReason),
    /// The next question went out. `phase` is the phase just answered.
    Replied { phase: SurveyPhase },
    /// Extraction succeeded and results were stored.
    Completed(CommitReport),
    /// Processing failed; the error was logged and nothing was sent.
    Dropped,
}

/// Result of resending a failed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    Resent(MessageId),
    /// The survey finished in the meantime; the original row is retired.
    SkippedCompleted,
}

pub struct SurveyService {
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    engine: ConversationEngine,
    from_number: Option<String>,
    visit_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl SurveyService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        config: &PitstopConfig,
    ) -> Self {
        Self {
            storage,
            channel,
            engine: ConversationEngine::new(
                provider,
                config.dealership.name.clone(),
                config.dealership.survey_prompt.clone(),
            ),
            from_number: config.sms.from_number.clone(),
            visit_locks: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Processes one inbound SMS. Never fails; errors are logged and the turn is dropped.
    pub async fn handle_inbound(
        &self,
        from: &str,
        body: &str,
        message_sid: Option<&str>,
    ) -> InboundOutcome {
        match self.process_inbound(from, body, message_sid).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(from, error = %e, "inbound message dropped");
                InboundOutcome::Dropped
            }
        }
    }

    async fn process_inbound(
        &self,
        from: &str,
        body: &str,
        message_sid: Option<&str>,
    ) -> Result<InboundOutcome, PitstopError> {
        let Some(customer) = self.storage.find_customer_by_phone(from).await? else {
            warn!(from, "inbound message from unknown number");
            self.log_inbound(None, from, body, message_sid).await;
            return Ok(InboundOutcome::Ignored(IgnoreReason::UnknownSender));
        };

        let Some(visit) = self.storage.latest_visit_for_customer(customer.id).await? else {
            warn!(customer_id = customer.id, "no service visit for inbound message");
            self.log_inbound(None, from, body, message_sid).await;
            return Ok(InboundOutcome::Ignored(IgnoreReason::NoServiceVisit));
        };
        self.log_inbound(Some(visit.id), from, body, message_sid).await;

        let lock = self.visit_lock(visit.id);
        let outcome = {
            let _guard = lock.lock().await;
            self.advance_survey(&customer, &visit, from, body).await
        };
        drop(lock);
        self.release_visit_lock(visit.id);
        outcome
    }

    /// Runs one survey turn. Callers hold the visit lock.
    async fn advance_survey(
        &self,
        customer: &Customer,
        visit: &ServiceVisit,
        from: &str,
        body: &str,
    ) -> Result<InboundOutcome, PitstopError> {
        let survey = match self.storage.survey_for_visit(visit.id).await? {
            Some(survey) => survey,
            None => {
                info!(visit_id = visit.id, "no survey record yet, creating one");
                self.storage
                    .create_survey(visit.id, customer.preferred_language)
                    .await?
            }
        };
        if survey.completed {
            debug!(survey_id = survey.id, "survey already completed, ignoring reply");
            return Ok(InboundOutcome::Ignored(IgnoreReason::SurveyCompleted));
        }

        let outcome = self
            .engine
            .advance(body, survey.conversation, customer.preferred_language)
            .await;
        self.storage
            .save_conversation(survey.id, &outcome.conversation)
            .await?;

        let language = outcome.language;
        match outcome.action {
            TurnAction::Reply(text) => {
                let step = outcome.phase.next().to_string();
                self.send_logged(Some(visit.id), from, &text, Some(&step), 0)
                    .await?;
                info!(survey_id = survey.id, phase = %outcome.phase, "survey question sent");
                Ok(InboundOutcome::Replied {
                    phase: outcome.phase,
                })
            }
            TurnAction::Extracted(result) => {
                let result = result?;
                let report = commit_survey_result(self.storage.as_ref(), survey.id, &result).await?;

                // Close in the language of the customer's last message.
                let thank_you = scripts::thank_you(language);
                if let Err(e) = self
                    .send_logged(Some(visit.id), from, thank_you, Some(THANK_YOU_STEP), 0)
                    .await
                {
                    warn!(survey_id = survey.id, error = %e, "thank-you message not sent");
                }
                Ok(InboundOutcome::Completed(report))
            }
        }
    }

    /// Records a delivery report. Returns false when no logged message carries `message_sid`.
    pub async fn handle_status(
        &self,
        message_sid: &str,
        status: &str,
    ) -> Result<bool, PitstopError> {
        let updated = self
            .storage
            .update_message_status(message_sid, status)
            .await?;
        if matches!(status, message_status::FAILED | message_status::UNDELIVERED) {
            warn!(message_sid, status, "message delivery failed");
        } else {
            debug!(message_sid, status, "message status updated");
        }
        if !updated {
            debug!(message_sid, "status report for unknown message");
        }
        Ok(updated)
    }

    /// Creates the survey record for `visit` and sends the greeting.
    pub async fn send_initial_survey(
        &self,
        visit: &ServiceVisit,
        customer: &Customer,
    ) -> Result<Survey, PitstopError> {
        let language = customer.preferred_language;
        let survey = self.storage.create_survey(visit.id, language).await?;
        let greeting = self.engine.greeting(language);
        let step = SurveyPhase::OverallSatisfaction.to_string();
        self.send_logged(Some(visit.id), &customer.phone, &greeting, Some(&step), 0)
            .await?;
        info!(visit_id = visit.id, survey_id = survey.id, %language, "survey started");
        Ok(survey)
    }

    /// Resends a failed outbound message verbatim and retires the original row.
    pub async fn resend_message(&self, log: &MessageLog) -> Result<ResendOutcome, PitstopError> {
        if let Some(visit_id) = log.service_visit_id
            && let Some(survey) = self.storage.survey_for_visit(visit_id).await?
            && survey.completed
            && log.message_step.as_deref() != Some(THANK_YOU_STEP)
        {
            info!(log_id = log.id, visit_id, "survey already completed, skipping resend");
            self.storage.mark_message_retried(log.id).await?;
            return Ok(ResendOutcome::SkippedCompleted);
        }

        let to = log.to_number.as_deref().ok_or_else(|| {
            PitstopError::Internal(format!("message log {} has no destination number", log.id))
        })?;
        let sent = self
            .send_logged(
                log.service_visit_id,
                to,
                &log.message_body,
                log.message_step.as_deref(),
                log.retries_count + 1,
            )
            .await;
        self.storage.mark_message_retried(log.id).await?;
        let id = sent?;
        info!(log_id = log.id, retries = log.retries_count + 1, "message resent");
        Ok(ResendOutcome::Resent(id))
    }

    /// Sends one SMS and records it as `sent`, or as `failed` so the retry job can pick it up.
    async fn send_logged(
        &self,
        visit_id: Option<i64>,
        to: &str,
        body: &str,
        step: Option<&str>,
        retries_count: u32,
    ) -> Result<MessageId, PitstopError> {
        let sent = self
            .channel
            .send(OutboundMessage {
                to: to.to_string(),
                body: body.to_string(),
            })
            .await;

        let (message_sid, status) = match &sent {
            Ok(id) => (Some(id.0.clone()), message_status::SENT),
            Err(_) => (None, message_status::FAILED),
        };
        let entry = NewMessageLog {
            service_visit_id: visit_id,
            message_sid,
            message_body: body.to_string(),
            direction: MessageDirection::Outbound,
            message_step: step.filter(|s| !s.is_empty()).map(str::to_string),
            from_number: self.from_number.clone(),
            to_number: Some(to.to_string()),
            status: status.to_string(),
            retries_count,
        };
        if let Err(e) = self.storage.insert_message_log(&entry).await {
            warn!(to, error = %e, "failed to log outbound message");
        }
        sent
    }

    async fn log_inbound(
        &self,
        visit_id: Option<i64>,
        from: &str,
        body: &str,
        message_sid: Option<&str>,
    ) {
        let entry = NewMessageLog {
            service_visit_id: visit_id,
            message_sid: message_sid.map(str::to_string),
            message_body: body.to_string(),
            direction: MessageDirection::Inbound,
            message_step: None,
            from_number: Some(from.to_string()),
            to_number: self.from_number.clone(),
            status: message_status::RECEIVED.to_string(),
            retries_count: 0,
        };
        if let Err(e) = self.storage.insert_message_log(&entry).await {
            warn!(from, error = %e, "failed to log inbound message");
        }
    }

    fn visit_lock(&self, visit_id: i64) -> Arc<Mutex<()>> {
        self.visit_locks.entry(visit_id).or_default().clone()
    }

    /// Drops the visit's lock entry once no other turn holds or awaits it.
    fn release_visit_lock(&self, visit_id: i64) {
        self.visit_locks
            .remove_if(&visit_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitstop_core::Language;
    use pitstop_test_utils::TestHarness;

    fn service(harness: &TestHarness) -> SurveyService {
        SurveyService::new(
            harness.storage.clone(),
            harness.mock_channel.clone(),
            harness.mock_provider.clone(),
            &harness.config,
        )
    }

    #[tokio::test]
    async fn visit_lock_released_after_each_turn() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness
            .customer_with_visit("+15550006666", Language::English)
            .await
            .unwrap();
        let service = service(&harness);

        let outcome = service.handle_inbound("+15550006666", "9", Some("SM1")).await;
        assert!(matches!(outcome, InboundOutcome::Replied { .. }));
        assert!(service.visit_locks.is_empty());

        // Abandoned mid-survey: nothing is left behind for the visit.
        service.handle_inbound("+15550006666", "8", Some("SM2")).await;
        assert!(service.visit_locks.is_empty());
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_visit_both_run_and_release() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness
            .customer_with_visit("+15550007777", Language::English)
            .await
            .unwrap();
        let service = service(&harness);

        let (first, second) = tokio::join!(
            service.handle_inbound("+15550007777", "9", Some("SM1")),
            service.handle_inbound("+15550007777", "8", Some("SM2")),
        );
        assert!(matches!(first, InboundOutcome::Replied { .. }));
        assert!(matches!(second, InboundOutcome::Replied { .. }));
        assert!(service.visit_locks.is_empty());

        let survey = harness
            .storage
            .list_surveys(&Default::default())
            .await
            .unwrap()
            .remove(0);
        let conversation = survey.conversation.unwrap();
        assert_eq!(conversation.customer_turns(), 2);
        assert_eq!(conversation.assistant_turns(), 3);
    }
}
