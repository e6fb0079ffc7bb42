// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Pitstop.
//!
//! Serves the two Twilio webhooks that drive the survey conversation and
//! the bearer-authenticated dashboard API over surveys, follow-up items,
//! customers and service visits.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webhooks;

pub use auth::AuthConfig;
pub use server::{GatewayState, build_router, start_server};
pub use webhooks::{EMPTY_TWIML, WebhookAuth};
