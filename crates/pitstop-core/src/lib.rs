// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pitstop service-survey workflow.
//!
//! This crate provides the adapter traits, error type, conversation model and
//! persistent record types shared by every other crate in the workspace.

pub mod error;
pub mod records;
pub mod traits;
pub mod types;

pub use error::PitstopError;
pub use types::{AdapterType, Conversation, HealthStatus, Language, MessageId, Speaker, Turn};

pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};
