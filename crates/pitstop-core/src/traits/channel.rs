// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the outbound SMS gateway.

use async_trait::async_trait;

use crate::error::PitstopError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageId, OutboundMessage};

/// Adapter for outbound messaging.
///
/// Inbound messages and delivery reports arrive through HTTP webhooks, so
/// the channel only sends. Each send yields a provider-unique [`MessageId`]
/// that later delivery reports refer to.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Sends a message and returns the gateway's identifier for it.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, PitstopError>;
}
