//! Local inspection of bearer tokens.
//!
//! Tokens are JWTs. Only the payload is read, to find the `exp` claim;
//! the signature is never verified here (the server does that).

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the epoch
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub iat: Option<f64>,
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
}

/// Decode the payload segment of a three-segment token
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Expiry instant of the token, if it has a readable `exp` claim
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token)?.exp?;
    DateTime::from_timestamp_millis((exp * 1000.0) as i64)
}

/// True when the token is absent, unreadable, or expired at `now`
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    match token.and_then(expires_at) {
        Some(expiry) => now >= expiry,
        None => true,
    }
}

pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{make_token, token_expiring_in};
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_decode_claims() {
        let token = make_token(json!({ "sub": "42", "exp": 1_700_000_000, "iat": 1_699_990_000 }));
        let claims = decode_claims(&token).expect("decodes");
        assert_eq!(claims.exp, Some(1_700_000_000.0));
        assert_eq!(claims.iat, Some(1_699_990_000.0));
        assert_eq!(claims.sub, Some(json!("42")));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_expired(None));
        assert!(is_expired(Some("")));
        assert!(is_expired(Some("not-a-token")));
        assert!(is_expired(Some("two.segments")));
        assert!(is_expired(Some("a.b.c.d")));
        assert!(is_expired(Some("header.!!!.sig")));
        // Decodes, but not JSON
        assert!(is_expired(Some("header.bm90IGpzb24.sig")));
    }

    #[test]
    fn test_missing_exp_is_expired() {
        let token = make_token(json!({ "sub": "42" }));
        assert!(decode_claims(&token).is_some());
        assert!(is_expired(Some(&token)));
    }

    #[test]
    fn test_past_and_future_expiry() {
        assert!(is_expired(Some(&token_expiring_in(-60))));
        assert!(!is_expired(Some(&token_expiring_in(3600))));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = make_token(json!({ "exp": 1_700_000_000 }));
        let expiry = expires_at(&token).expect("has expiry");
        assert_eq!(expiry.timestamp(), 1_700_000_000);

        assert!(!is_expired_at(Some(&token), expiry - Duration::milliseconds(1)));
        assert!(is_expired_at(Some(&token), expiry));
    }

    #[test]
    fn test_fractional_exp_and_padding() {
        let token = make_token(json!({ "exp": 1_700_000_000.5 }));
        let expiry = expires_at(&token).expect("has expiry");
        assert_eq!(expiry.timestamp_millis(), 1_700_000_000_500);

        // Padded payloads are tolerated
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1].push_str("==");
        let padded = parts.join(".");
        assert_eq!(expires_at(&padded), Some(expiry));
    }
}
