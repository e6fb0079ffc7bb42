// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pitstop integration tests.
//!
//! Provides mock adapters and a temp-database harness for fast,
//! deterministic tests without Gemini or Twilio.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted generative backend with prompt capture
//! - [`MockChannel`] - SMS channel that records sends and can be made to fail
//! - [`TestHarness`] - Temp SQLite storage plus both mocks and fixture helpers
//! - [`FlakyStorage`] - Storage wrapper that rejects selected follow-up inserts

pub mod flaky_storage;
pub mod harness;
pub mod mock_channel;
pub mod mock_provider;

pub use flaky_storage::FlakyStorage;
pub use harness::TestHarness;
pub use mock_channel::MockChannel;
pub use mock_provider::MockProvider;
