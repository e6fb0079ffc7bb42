// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock SMS channel for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter`, captures every successful send
//! and can be switched into a failing mode to exercise retry paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pitstop_core::PitstopError;
use pitstop_core::traits::adapter::PluginAdapter;
use pitstop_core::traits::channel::ChannelAdapter;
use pitstop_core::types::{AdapterType, HealthStatus, MessageId, OutboundMessage};

/// A mock SMS channel.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<(MessageId, OutboundMessage)>>>,
    failing: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel that accepts every send.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// When set, every `send` fails with a channel error and nothing is captured.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.iter().map(|(_, m)| m.clone()).collect()
    }

    /// Message bodies in send order.
    pub async fn sent_bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, m)| m.body.clone())
            .collect()
    }

    /// The most recent send with its assigned id.
    pub async fn last_sent(&self) -> Option<(MessageId, OutboundMessage)> {
        self.sent.lock().await.last().cloned()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PitstopError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PitstopError::Channel {
                message: format!("mock send to {} failed", msg.to),
                source: None,
            });
        }
        let id = MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4()));
        self.sent.lock().await.push((id.clone(), msg));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(body: &str) -> OutboundMessage {
        OutboundMessage {
            to: "+15550001111".to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let id = channel.send(msg("hello")).await.unwrap();
        assert!(id.0.starts_with("mock-msg-"));

        assert_eq!(channel.sent_bodies().await, vec!["hello".to_string()]);
        let (last_id, last) = channel.last_sent().await.unwrap();
        assert_eq!(last_id, id);
        assert_eq!(last.to, "+15550001111");
    }

    #[tokio::test]
    async fn failing_mode_rejects_sends() {
        let channel = MockChannel::new();
        channel.set_failing(true);
        assert!(channel.send(msg("lost")).await.is_err());
        assert_eq!(channel.sent_count().await, 0);

        channel.set_failing(false);
        channel.send(msg("ok")).await.unwrap();
        assert_eq!(channel.sent_count().await, 1);

        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }
}
