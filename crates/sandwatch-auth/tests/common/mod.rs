/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for sandwatch-auth tests

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sandwatch_auth::{ClientConfig, MemoryTokenStore, SandwatchClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server's `/v1` prefix
pub fn client_for(server: &MockServer, store: &MemoryTokenStore) -> SandwatchClient {
    let config = ClientConfig {
        base_url: format!("{}/v1", server.uri()),
        ..ClientConfig::default()
    };
    SandwatchClient::with_config(config, Arc::new(store.clone())).expect("client init")
}

/// JWT-shaped token with the given `exp`
pub fn jwt_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"principalId":"wallet"}}"#));
    format!("{header}.{payload}.signature")
}

/// Token valid for the next hour
#[allow(dead_code)]
pub fn fresh_jwt() -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() + 3600)
}

/// Gateway envelope carrying a token pair
pub fn auth_envelope(token: &str, refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "statusCode": 200,
        "body": serde_json::json!({"token": token, "refresh_token": refresh_token}).to_string(),
    })
}
