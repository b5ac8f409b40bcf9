/*
[INPUT]:  Token values produced by auth endpoints or read from storage
[OUTPUT]: Token pair model shared by client, store and sign-in flow
[POS]:    Data layer - domain models
[UPDATE]: When token bundle shape changes
*/

use serde::{Deserialize, Serialize};

/// Access/refresh token bundle. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}
