// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio webhook handlers.
//!
//! `POST /api/webhooks/twilio/message` drives one survey turn and always
//! answers `200` with an empty TwiML document; replies go out through the
//! REST API, never in the webhook response. `POST /api/webhooks/twilio/status`
//! records delivery reports.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use pitstop_config::model::SmsConfig;
use pitstop_sms::signature::{SIGNATURE_HEADER, verify_signature};
use pitstop_sms::types::{InboundSms, StatusCallback};
use pitstop_survey::InboundOutcome;
use tracing::{debug, error, info, warn};

use crate::server::GatewayState;

/// Empty TwiML document: acknowledge without replying inline.
pub const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

/// Settings for verifying `X-Twilio-Signature`.
#[derive(Clone)]
pub struct WebhookAuth {
    /// Twilio auth token used as the HMAC key.
    pub auth_token: Option<String>,
    /// Externally visible base URL Twilio posts to, e.g. `https://surveys.example.com`.
    pub public_base_url: Option<String>,
    /// When false, signatures are not checked.
    pub validate_signatures: bool,
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("public_base_url", &self.public_base_url)
            .field("validate_signatures", &self.validate_signatures)
            .finish()
    }
}

impl WebhookAuth {
    /// Reads the `[sms]` section, falling back to `TWILIO_AUTH_TOKEN` for the token.
    pub fn from_config(config: &SmsConfig) -> Self {
        let auth_token = config
            .auth_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| {
                std::env::var("TWILIO_AUTH_TOKEN")
                    .ok()
                    .filter(|t| !t.is_empty())
            });
        Self {
            auth_token,
            public_base_url: config.public_base_url.clone(),
            validate_signatures: config.validate_signatures,
        }
    }

    /// Checks the request signature. Fails closed when validation is on but
    /// the token or public URL is missing.
    fn verify(&self, uri: &Uri, headers: &HeaderMap, params: &[(String, String)]) -> bool {
        if !self.validate_signatures {
            return true;
        }
        let (Some(token), Some(base)) = (self.auth_token.as_deref(), self.public_base_url.as_deref())
        else {
            error!("signature validation is on but sms.auth_token or sms.public_base_url is unset");
            return false;
        };
        let Some(signature) = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let url = format!("{}{}", base.trim_end_matches('/'), path);
        verify_signature(token, &url, params, signature)
    }
}

fn twiml() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}

/// Verifies the signature over the decoded form, or returns the rejection.
fn authenticate(state: &GatewayState, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Result<(), Response> {
    let params: Vec<(String, String)> = serde_urlencoded::from_bytes(body).unwrap_or_default();
    if state.webhook.verify(uri, headers, &params) {
        Ok(())
    } else {
        warn!(path = %uri.path(), "rejected webhook with invalid Twilio signature");
        Err(StatusCode::FORBIDDEN.into_response())
    }
}

/// POST /api/webhooks/twilio/message
pub async fn post_twilio_message(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authenticate(&state, &uri, &headers, &body) {
        return rejection;
    }

    let sms: InboundSms = match serde_urlencoded::from_bytes(&body) {
        Ok(sms) => sms,
        Err(e) => {
            warn!(error = %e, "malformed inbound SMS webhook");
            return twiml();
        }
    };
    info!(from = %sms.from, sid = ?sms.message_sid, "inbound SMS");

    let outcome = state
        .service
        .handle_inbound(&sms.from, &sms.body, sms.message_sid.as_deref())
        .await;
    match &outcome {
        InboundOutcome::Ignored(reason) => debug!(from = %sms.from, ?reason, "inbound SMS ignored"),
        InboundOutcome::Replied { phase } => debug!(from = %sms.from, %phase, "survey turn answered"),
        InboundOutcome::Completed(report) => info!(
            from = %sms.from,
            follow_up_items = report.follow_up_items,
            positive_remarks = report.positive_remarks,
            "survey completed"
        ),
        InboundOutcome::Dropped => {}
    }
    twiml()
}

/// POST /api/webhooks/twilio/status
pub async fn post_twilio_status(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authenticate(&state, &uri, &headers, &body) {
        return rejection;
    }

    let callback: StatusCallback = match serde_urlencoded::from_bytes(&body) {
        Ok(cb) => cb,
        Err(e) => {
            warn!(error = %e, "malformed status callback");
            return (StatusCode::BAD_REQUEST, "Malformed status callback").into_response();
        }
    };
    if let Some(code) = &callback.error_code {
        debug!(sid = %callback.message_sid, error_code = %code, "delivery error code reported");
    }

    match state
        .service
        .handle_status(&callback.message_sid, &callback.message_status)
        .await
    {
        Ok(_) => (StatusCode::OK, "Status update received").into_response(),
        Err(e) => {
            error!(sid = %callback.message_sid, error = %e, "failed to record message status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing status update",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitstop_sms::signature::compute_signature;

    fn auth(validate: bool) -> WebhookAuth {
        WebhookAuth {
            auth_token: Some("token".into()),
            public_base_url: Some("https://surveys.example.com/".into()),
            validate_signatures: validate,
        }
    }

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".into(), "+15550001111".into()),
            ("Body".into(), "9".into()),
        ]
    }

    fn headers_with(signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, signature.parse().unwrap());
        headers
    }

    #[test]
    fn verify_uses_public_url_and_path() {
        let uri: Uri = "/api/webhooks/twilio/message".parse().unwrap();
        let sig = compute_signature(
            "token",
            "https://surveys.example.com/api/webhooks/twilio/message",
            &params(),
        )
        .unwrap();
        assert!(auth(true).verify(&uri, &headers_with(&sig), &params()));

        let other: Uri = "/api/webhooks/twilio/status".parse().unwrap();
        assert!(!auth(true).verify(&other, &headers_with(&sig), &params()));
    }

    #[test]
    fn verify_rejects_missing_header() {
        let uri: Uri = "/api/webhooks/twilio/message".parse().unwrap();
        assert!(!auth(true).verify(&uri, &HeaderMap::new(), &params()));
    }

    #[test]
    fn verify_fails_closed_without_token() {
        let uri: Uri = "/api/webhooks/twilio/message".parse().unwrap();
        let webhook = WebhookAuth {
            auth_token: None,
            ..auth(true)
        };
        assert!(!webhook.verify(&uri, &headers_with("anything"), &params()));
    }

    #[test]
    fn verify_skipped_when_disabled() {
        let uri: Uri = "/api/webhooks/twilio/message".parse().unwrap();
        assert!(auth(false).verify(&uri, &HeaderMap::new(), &params()));
    }

    #[test]
    fn debug_redacts_token() {
        let out = format!("{:?}", auth(true));
        assert!(!out.contains("\"token\""));
        assert!(out.contains("[redacted]"));
    }
}
