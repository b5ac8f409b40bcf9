/*
[INPUT]:  Storage key names and playground provider names
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When storage keys or connection providers change
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keys of the durable token store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKey {
    #[serde(rename = "accessToken")]
    AccessToken,
    #[serde(rename = "refreshToken")]
    RefreshToken,
}

impl TokenKey {
    pub const ALL: [TokenKey; 2] = [TokenKey::AccessToken, TokenKey::RefreshToken];

    /// Storage key string
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKey::AccessToken => "accessToken",
            TokenKey::RefreshToken => "refreshToken",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Social account providers reachable through `/connections/{provider}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionProvider {
    Twitter,
    Discord,
    Telegram,
    Instagram,
}

impl ConnectionProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionProvider::Twitter => "twitter",
            ConnectionProvider::Discord => "discord",
            ConnectionProvider::Telegram => "telegram",
            ConnectionProvider::Instagram => "instagram",
        }
    }
}

impl fmt::Display for ConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(ConnectionProvider::Twitter),
            "discord" => Ok(ConnectionProvider::Discord),
            "telegram" => Ok(ConnectionProvider::Telegram),
            "instagram" => Ok(ConnectionProvider::Instagram),
            other => Err(format!("unknown connection provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_strings() {
        assert_eq!(TokenKey::AccessToken.as_str(), "accessToken");
        assert_eq!(TokenKey::RefreshToken.as_str(), "refreshToken");
        assert_eq!(
            serde_json::to_string(&TokenKey::RefreshToken).unwrap(),
            "\"refreshToken\""
        );
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("X".parse::<ConnectionProvider>(), Ok(ConnectionProvider::Twitter));
        assert_eq!(
            "discord".parse::<ConnectionProvider>(),
            Ok(ConnectionProvider::Discord)
        );
        assert!("myspace".parse::<ConnectionProvider>().is_err());
    }
}
