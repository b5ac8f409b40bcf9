/*
[INPUT]:  Stored tokens before a request, buffered responses after it
[OUTPUT]: Bearer token for the outgoing request; tokens persisted from auth responses
[POS]:    HTTP layer - request/response token stages
[UPDATE]: When refresh policy or auth endpoint detection changes
*/

use reqwest::{Method, Url};
use tracing::{debug, warn};

use crate::auth::jwt;
use crate::http::{ApiResponse, Result, SandwatchClient, SandwatchError};
use crate::types::{AuthEnvelope, RefreshTokenRequest, TokenKey, TokenPair};

pub const ACCESS_TOKEN_ENDPOINT: &str = "auth/access_token";
pub const REFRESH_TOKEN_ENDPOINT: &str = "auth/refresh_token";

/// What the request stage did about token freshness
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No token stored, or the stored one is still valid
    NotNeeded,
    /// Token was expired and no refresh token is stored
    NoRefreshToken,
    /// A fresh access token is attached
    Refreshed,
    /// Refresh exchange failed; the expired token is attached unchanged
    Failed(String),
}

/// Result of the request stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Token to send as `Authorization: Bearer <token>`
    pub token: Option<String>,
    pub refresh: RefreshOutcome,
}

impl Authorization {
    fn new(token: Option<String>, refresh: RefreshOutcome) -> Self {
        Self { token, refresh }
    }
}

/// Whether a URL targets one of the token-issuing endpoints
pub fn is_auth_endpoint(url: &Url) -> bool {
    let path = url.path();
    path.ends_with("/auth/access_token") || path.ends_with("/auth/refresh_token")
}

impl SandwatchClient {
    /// Request stage: pick the bearer token for the next request, refreshing
    /// an expired one when a refresh token is stored.
    ///
    /// A malformed stored access token is an error; refresh failures are not.
    pub async fn authorize(&self) -> Result<Authorization> {
        let Some(access) = self.store().get(TokenKey::AccessToken).await? else {
            return Ok(Authorization::new(None, RefreshOutcome::NotNeeded));
        };

        if !jwt::is_expired(&access)? {
            return Ok(Authorization::new(Some(access), RefreshOutcome::NotNeeded));
        }
        debug!("access token expired");

        if !self.policy().single_flight {
            return Ok(self.refresh_expired(access).await);
        }

        let mut last_refresh = self.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited on the lock
        if let Some((expired, refreshed)) = last_refresh.as_ref() {
            if *expired == access && matches!(jwt::is_expired(refreshed), Ok(false)) {
                debug!("reusing access token refreshed by an earlier request");
                return Ok(Authorization::new(
                    Some(refreshed.clone()),
                    RefreshOutcome::Refreshed,
                ));
            }
        }
        if let Some(current) = self.store().get(TokenKey::AccessToken).await? {
            if current != access && !jwt::is_expired(&current)? {
                debug!("reusing access token refreshed by a concurrent request");
                return Ok(Authorization::new(Some(current), RefreshOutcome::Refreshed));
            }
        }

        let authorization = self.refresh_expired(access.clone()).await;
        if let (RefreshOutcome::Refreshed, Some(token)) =
            (&authorization.refresh, &authorization.token)
        {
            *last_refresh = Some((access, token.clone()));
        }
        Ok(authorization)
    }

    async fn refresh_expired(&self, expired: String) -> Authorization {
        let refresh_token = match self.store().get(TokenKey::RefreshToken).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no refresh token stored");
                return Authorization::new(Some(expired), RefreshOutcome::NoRefreshToken);
            }
            Err(err) => {
                warn!(error = %err, "Refresh token failed");
                return Authorization::new(Some(expired), RefreshOutcome::Failed(err.to_string()));
            }
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(pair) => {
                if self.policy().persist_refreshed {
                    if let Err(err) = self.store().save_pair(&pair).await {
                        warn!(error = %err, "failed to persist refreshed tokens");
                    }
                }
                debug!(persisted = self.policy().persist_refreshed, "access token refreshed");
                Authorization::new(pair.access, RefreshOutcome::Refreshed)
            }
            Err(err) => {
                warn!(error = %err, "Refresh token failed");
                Authorization::new(Some(expired), RefreshOutcome::Failed(err.to_string()))
            }
        }
    }

    /// POST the refresh token without running either token stage
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        let builder = self
            .request(Method::POST, REFRESH_TOKEN_ENDPOINT)?
            .json(&body);
        let response = self.execute_raw(builder).await?;
        let pair = tokens_from_response(response)?;

        if pair.access.is_none() {
            return Err(SandwatchError::RefreshFailed(
                "refresh response carried no access token".to_string(),
            ));
        }
        Ok(pair)
    }

    /// Response stage: persist tokens returned by the auth endpoints.
    ///
    /// Other URLs and non-2xx responses are left alone.
    pub(crate) async fn capture_tokens(&self, response: &ApiResponse) -> Result<Option<TokenPair>> {
        if !response.is_success() || !is_auth_endpoint(response.url()) {
            return Ok(None);
        }

        let envelope: AuthEnvelope = response
            .json()
            .map_err(|e| SandwatchError::InvalidResponse(format!("auth response envelope: {e}")))?;
        let body = envelope
            .token_body()
            .map_err(|e| SandwatchError::InvalidResponse(format!("auth response body: {e}")))?;
        let pair = TokenPair::from(body);

        self.store().save_pair(&pair).await?;
        debug!(
            url = %response.url(),
            access = pair.access.is_some(),
            refresh = pair.refresh.is_some(),
            "persisted tokens from auth response"
        );

        Ok(Some(pair))
    }
}

/// Decode an auth endpoint response into a token pair, surfacing HTTP and
/// envelope-level failures as API errors.
pub(crate) fn tokens_from_response(response: ApiResponse) -> Result<TokenPair> {
    let status = response.status();
    let envelope: AuthEnvelope = response.into_json()?;
    let body = envelope
        .token_body()
        .map_err(|e| SandwatchError::InvalidResponse(format!("auth response body: {e}")))?;

    if envelope.is_error() {
        let code = envelope.status_code.map(i32::from).unwrap_or(status.as_u16() as i32);
        return Err(SandwatchError::Api {
            code,
            message: body.error.unwrap_or_else(|| "authentication failed".to_string()),
        });
    }

    Ok(body.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::Utc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{MemoryTokenStore, TokenStore};
    use crate::http::{ClientConfig, RefreshPolicy};

    fn make_token(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }

    fn fresh_token(tag: &str) -> String {
        format!("{}{tag}", make_token(Utc::now().timestamp() + 3600))
    }

    fn auth_body(token: &str, refresh: &str) -> serde_json::Value {
        serde_json::json!({
            "body": serde_json::json!({"token": token, "refresh_token": refresh}).to_string(),
        })
    }

    fn client_for(
        server: &MockServer,
        store: &MemoryTokenStore,
        refresh: RefreshPolicy,
    ) -> SandwatchClient {
        let config = ClientConfig {
            base_url: format!("{}/v1", server.uri()),
            refresh,
            ..ClientConfig::default()
        };
        SandwatchClient::with_config(config, Arc::new(store.clone())).unwrap()
    }

    #[test]
    fn test_is_auth_endpoint() {
        let url = |s: &str| Url::parse(s).unwrap();
        assert!(is_auth_endpoint(&url("https://h/v1/auth/access_token")));
        assert!(is_auth_endpoint(&url("https://h/v1/auth/refresh_token?x=1")));
        assert!(!is_auth_endpoint(&url("https://h/v1/auth/access_token/extra")));
        assert!(!is_auth_endpoint(&url("https://h/v1/connections/discord")));
    }

    #[tokio::test]
    async fn test_valid_token_is_attached_without_refresh() {
        let server = MockServer::start().await;
        let token = fresh_token("");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(token.clone(), "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let authorization = client.authorize().await.unwrap();
        assert_eq!(authorization.token, Some(token));
        assert_eq!(authorization.refresh, RefreshOutcome::NotNeeded);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_keeps_old_token() {
        let server = MockServer::start().await;
        let expired = make_token(1);
        let store = MemoryTokenStore::new();
        store.set(TokenKey::AccessToken, &expired).await.unwrap();
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let authorization = client.authorize().await.unwrap();
        assert_eq!(authorization.token, Some(expired));
        assert_eq!(authorization.refresh, RefreshOutcome::NoRefreshToken);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_typed_and_fails_open() {
        let server = MockServer::start().await;
        let expired = make_token(1);
        let store = MemoryTokenStore::with_pair(&TokenPair::new(expired.clone(), "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let authorization = client.authorize().await.unwrap();
        assert_eq!(authorization.token, Some(expired.clone()));
        assert!(matches!(authorization.refresh, RefreshOutcome::Failed(_)));
        assert_eq!(
            store.get(TokenKey::AccessToken).await.unwrap(),
            Some(expired)
        );
    }

    #[tokio::test]
    async fn test_refresh_without_write_back() {
        let server = MockServer::start().await;
        let expired = make_token(1);
        let refreshed = fresh_token("new");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(expired.clone(), "R"));
        let policy = RefreshPolicy {
            persist_refreshed: false,
            single_flight: false,
        };
        let client = client_for(&server, &store, policy);

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .and(body_json(serde_json::json!({"refreshToken": "R"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(&refreshed, "R2")))
            .expect(2)
            .mount(&server)
            .await;

        for _ in 0..2 {
            let authorization = client.authorize().await.unwrap();
            assert_eq!(authorization.token.as_deref(), Some(refreshed.as_str()));
            assert_eq!(authorization.refresh, RefreshOutcome::Refreshed);
        }
        assert_eq!(store.load_pair().await.unwrap(), TokenPair::new(expired, "R"));
    }

    #[tokio::test]
    async fn test_refresh_with_write_back() {
        let server = MockServer::start().await;
        let refreshed = fresh_token("new");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(make_token(1), "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(&refreshed, "R2")))
            .expect(1)
            .mount(&server)
            .await;

        client.authorize().await.unwrap();
        let second = client.authorize().await.unwrap();

        assert_eq!(second.token.as_deref(), Some(refreshed.as_str()));
        assert_eq!(second.refresh, RefreshOutcome::NotNeeded);
        assert_eq!(
            store.load_pair().await.unwrap(),
            TokenPair::new(refreshed, "R2")
        );
    }

    #[tokio::test]
    async fn test_malformed_stored_token_aborts_request() {
        let server = MockServer::start().await;
        let store = MemoryTokenStore::with_pair(&TokenPair::new("garbage", "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let builder = client.request(Method::GET, "connections/discord").unwrap();
        let err = client.send(builder).await.unwrap_err();
        assert!(matches!(err, SandwatchError::MalformedToken(_)));
    }

    #[tokio::test]
    async fn test_non_auth_response_leaves_store_unchanged() {
        let server = MockServer::start().await;
        let token = fresh_token("");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(token.clone(), "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("GET"))
            .and(path("/v1/connections/discord"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("X", "Y")))
            .expect(1)
            .mount(&server)
            .await;

        let builder = client.request(Method::GET, "connections/discord").unwrap();
        let response = client.send(builder).await.unwrap();
        assert!(response.is_success());
        assert_eq!(store.load_pair().await.unwrap(), TokenPair::new(token, "R"));
    }

    #[tokio::test]
    async fn test_failed_auth_response_is_not_persisted() {
        let server = MockServer::start().await;
        let store = MemoryTokenStore::new();
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .and(path("/v1/auth/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(auth_body("A", "R")))
            .mount(&server)
            .await;

        let builder = client.request(Method::POST, ACCESS_TOKEN_ENDPOINT).unwrap();
        let response = client.send(builder).await.unwrap();
        assert_eq!(response.status().as_u16(), 401);
        assert!(store.load_pair().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_flight_without_write_back_refreshes_once() {
        let server = MockServer::start().await;
        let expired = make_token(1);
        let refreshed = fresh_token("new");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(expired.clone(), "R"));
        let policy = RefreshPolicy {
            persist_refreshed: false,
            single_flight: true,
        };
        let client = client_for(&server, &store, policy);

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(auth_body(&refreshed, "R2"))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (a, b, c) = tokio::join!(client.authorize(), client.authorize(), client.authorize());
        for authorization in [a.unwrap(), b.unwrap(), c.unwrap()] {
            assert_eq!(authorization.token.as_deref(), Some(refreshed.as_str()));
            assert_eq!(authorization.refresh, RefreshOutcome::Refreshed);
        }
        assert_eq!(store.load_pair().await.unwrap(), TokenPair::new(expired, "R"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_refresh() {
        let server = MockServer::start().await;
        let refreshed = fresh_token("new");
        let store = MemoryTokenStore::with_pair(&TokenPair::new(make_token(1), "R"));
        let client = client_for(&server, &store, RefreshPolicy::default());

        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(auth_body(&refreshed, "R2"))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (a, b, c) = tokio::join!(client.authorize(), client.authorize(), client.authorize());
        for authorization in [a.unwrap(), b.unwrap(), c.unwrap()] {
            assert_eq!(authorization.token.as_deref(), Some(refreshed.as_str()));
            assert_eq!(authorization.refresh, RefreshOutcome::Refreshed);
        }
    }
}
