/*
[INPUT]:  JWT token strings and the current time
[OUTPUT]: Decoded claims and expiration status
[POS]:    Auth layer - token lifecycle checks
[UPDATE]: When token payload format or expiry rule changes
*/

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::http::{Result, SandwatchError};

/// Claims read from the token payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiration, Unix seconds
    pub exp: f64,
    /// Wallet public key the token was issued to
    #[serde(rename = "principalId", default)]
    pub principal_id: Option<String>,
}

impl TokenClaims {
    /// Expiration as milliseconds since the epoch
    pub fn expires_at_millis(&self) -> f64 {
        self.exp * 1000.0
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at_millis() as i64)
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at_millis() <= now_millis as f64
    }
}

/// Decode the payload segment of a token.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut parts = token.trim().split('.');
    let payload_b64 = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) => payload,
        _ => {
            return Err(SandwatchError::MalformedToken(
                "expected at least two dot-separated segments".to_string(),
            ));
        }
    };

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .or_else(|_| STANDARD.decode(payload_b64))
        .or_else(|_| STANDARD_NO_PAD.decode(payload_b64))
        .map_err(|e| SandwatchError::MalformedToken(format!("payload is not base64: {e}")))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|e| SandwatchError::MalformedToken(format!("payload is not valid claims: {e}")))
}

/// True iff `exp * 1000 <= now_millis`. No clock-skew tolerance.
pub fn is_expired_at(token: &str, now_millis: i64) -> Result<bool> {
    Ok(decode_claims(token)?.is_expired_at(now_millis))
}

/// Expiry check against the wall clock
pub fn is_expired(token: &str) -> Result<bool> {
    is_expired_at(token, now_millis())
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
