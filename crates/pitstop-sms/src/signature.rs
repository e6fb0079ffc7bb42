// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio request signature (`X-Twilio-Signature`) computation and verification.
//!
//! The signature is base64(HMAC-SHA1(auth_token, url + k1 + v1 + k2 + v2 ...))
//! with the POST parameters sorted by key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Header Twilio signs webhook requests with.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

fn mac_for(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

/// Computes the expected signature for a webhook request.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Option<String> {
    let mac = mac_for(auth_token, url, params)?;
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies `signature` in constant time. Malformed base64 never verifies.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    mac_for(auth_token, url, params).is_some_and(|mac| mac.verify_slice(&provided).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".to_string(), "+15550001111".to_string()),
            ("Body".to_string(), "9".to_string()),
            ("MessageSid".to_string(), "SM123".to_string()),
        ]
    }

    #[test]
    fn signature_is_order_independent() {
        let url = "https://surveys.example.com/api/webhooks/twilio/message";
        let mut reversed = params();
        reversed.reverse();
        assert_eq!(
            compute_signature("token", url, &params()),
            compute_signature("token", url, &reversed)
        );
    }

    #[test]
    fn verify_accepts_own_signature() {
        let url = "https://surveys.example.com/api/webhooks/twilio/message";
        let sig = compute_signature("token", url, &params()).unwrap();
        assert!(verify_signature("token", url, &params(), &sig));
    }

    #[test]
    fn verify_rejects_tampering() {
        let url = "https://surveys.example.com/api/webhooks/twilio/message";
        let sig = compute_signature("token", url, &params()).unwrap();

        assert!(!verify_signature("other-token", url, &params(), &sig));
        assert!(!verify_signature("token", "https://evil.example.com/", &params(), &sig));

        let mut altered = params();
        altered[1].1 = "1".to_string();
        assert!(!verify_signature("token", url, &altered, &sig));
        assert!(!verify_signature("token", url, &params(), "not base64!!"));
    }

    #[test]
    fn known_vector() {
        // Sorted concatenation: url + "Body9" + "From+15550001111" + "MessageSidSM123".
        let url = "https://example.com/hook";
        let expected = {
            let mut mac = HmacSha1::new_from_slice(b"secret").unwrap();
            mac.update(b"https://example.com/hookBody9From+15550001111MessageSidSM123");
            STANDARD.encode(mac.finalize().into_bytes())
        };
        assert_eq!(compute_signature("secret", url, &params()), Some(expected));
    }
}
