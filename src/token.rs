//! Bearer-token expiration handling.
//!
//! Interprets the expiration claim of a compact three-part signed token
//! without verifying the signature. This is an expiration probe for
//! session-refresh heuristics, not an authorization check; the server
//! remains the authority on token validity.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from interpreting a compact token.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token does not have exactly three segments")]
    MalformedToken,

    #[error("Token segment is not valid base64url JSON")]
    DecodeFailed,

    #[error("Token carries no usable expiration claim")]
    MissingClaim,
}

/// A bearer token in compact serialized form.
///
/// The raw string is what is stored and transmitted; this wrapper exists
/// only for local embedding in user records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The expiration instant encoded in the token, if one can be read.
    pub fn expiration(&self) -> Result<DateTime<Utc>, TokenError> {
        expiration_claim(&self.token)
    }

    /// Whether the token has expired as of `instant`.
    ///
    /// A token whose expiration cannot be determined counts as expired
    /// (fail-closed).
    pub fn is_expired_at(&self, instant: DateTime<Utc>) -> bool {
        match self.expiration() {
            Ok(expiration) => expiration <= instant,
            Err(_) => true,
        }
    }

    /// Whether the token has expired as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Extract the expiration claim from a compact token string.
///
/// Splits on `.`, requires exactly three segments, base64url-decodes the
/// first segment, and reads the integer `exp` claim (seconds since epoch).
/// The signature is never checked.
pub fn expiration_claim(token: &str) -> Result<DateTime<Utc>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::MalformedToken);
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|_| TokenError::DecodeFailed)?;
    let claims: Value = serde_json::from_slice(&decoded).map_err(|_| TokenError::DecodeFailed)?;

    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or(TokenError::MissingClaim)?;

    DateTime::from_timestamp(exp, 0).ok_or(TokenError::MissingClaim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_with_claims(claims: &str) -> AuthToken {
        let header = URL_SAFE_NO_PAD.encode(claims.as_bytes());
        AuthToken::new(format!("{}.payload.signature", header))
    }

    #[test]
    fn reads_expiration_claim() {
        let token = token_with_claims(r#"{"alg":"HS256","exp":1700000000}"#);

        let expiration = token.expiration().unwrap();
        assert_eq!(expiration, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn expired_and_valid_instants() {
        let token = token_with_claims(r#"{"exp":1700000000}"#);

        let before = Utc.timestamp_opt(1_699_999_999, 0).unwrap();
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let after = Utc.timestamp_opt(1_700_000_001, 0).unwrap();

        assert!(!token.is_expired_at(before));
        assert!(token.is_expired_at(at));
        assert!(token.is_expired_at(after));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        assert_eq!(
            expiration_claim("only.two").unwrap_err(),
            TokenError::MalformedToken
        );
        assert_eq!(
            expiration_claim("one.two.three.four").unwrap_err(),
            TokenError::MalformedToken
        );
        assert_eq!(expiration_claim("").unwrap_err(), TokenError::MalformedToken);
    }

    #[test]
    fn unparseable_segment_is_a_decode_failure() {
        assert_eq!(
            expiration_claim("!!!.payload.signature").unwrap_err(),
            TokenError::DecodeFailed
        );

        let not_json = URL_SAFE_NO_PAD.encode(b"not json at all");
        assert_eq!(
            expiration_claim(&format!("{}.p.s", not_json)).unwrap_err(),
            TokenError::DecodeFailed
        );
    }

    #[test]
    fn missing_or_non_integer_claim() {
        assert_eq!(
            token_with_claims(r#"{"alg":"HS256"}"#).expiration().unwrap_err(),
            TokenError::MissingClaim
        );
        assert_eq!(
            token_with_claims(r#"{"exp":"tomorrow"}"#).expiration().unwrap_err(),
            TokenError::MissingClaim
        );
    }

    #[test]
    fn failures_read_as_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert!(AuthToken::new("garbage").is_expired_at(now));
        assert!(AuthToken::new("a.b").is_expired_at(now));
        assert!(AuthToken::new("!!!.b.c").is_expired_at(now));
        assert!(token_with_claims(r#"{"no":"exp"}"#).is_expired_at(now));
    }

    #[test]
    fn wrapper_wire_format() {
        let token = AuthToken::new("a.b.c");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"token":"a.b.c"}"#);

        let roundtripped: AuthToken = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtripped, token);
    }
}
