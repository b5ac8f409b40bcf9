/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::TokenPair;

/// Gateway envelope returned by the auth endpoints.
///
/// `body` is normally a JSON document encoded as a string; an inline object is
/// accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthEnvelope {
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub body: serde_json::Value,
}

impl AuthEnvelope {
    /// Decode the inner token document
    pub fn token_body(&self) -> serde_json::Result<TokenBody> {
        match &self.body {
            serde_json::Value::String(raw) => serde_json::from_str(raw),
            other => TokenBody::deserialize(other),
        }
    }

    /// Whether the embedded status code (if any) reports failure
    pub fn is_error(&self) -> bool {
        self.status_code
            .is_some_and(|code| !(200..300).contains(&code))
    }
}

/// Inner document of an auth response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TokenBody> for TokenPair {
    fn from(body: TokenBody) -> Self {
        TokenPair {
            access: body.token,
            refresh: body.refresh_token,
        }
    }
}
