/*
[INPUT]:  HTTP configuration (base URL, timeouts, refresh policy) and a token store
[OUTPUT]: Configured reqwest client that authorizes and post-processes every call
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::TokenStore;
use crate::http::{ApiResponse, Result};

/// Base URL of the Sandwatch API gateway
pub const DEFAULT_BASE_URL: &str = "https://3v4i2pavob.execute-api.us-west-2.amazonaws.com/v1/";

/// How the request stage deals with an expired access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Write refreshed tokens back to the store right away
    pub persist_refreshed: bool,
    /// Allow only one refresh exchange at a time per client
    pub single_flight: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            persist_refreshed: true,
            single_flight: true,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub refresh: RefreshPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            refresh: RefreshPolicy::default(),
        }
    }
}

/// Main HTTP client for the Sandwatch API
#[derive(Clone)]
pub struct SandwatchClient {
    http_client: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    policy: RefreshPolicy,
    /// Serializes refreshes; holds the last `(expired, refreshed)` exchange
    pub(crate) refresh_lock: Arc<Mutex<Option<(String, String)>>>,
}

impl fmt::Debug for SandwatchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandwatchClient")
            .field("base_url", &self.base_url.as_str())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SandwatchClient {
    /// Create a new client with default configuration
    pub fn new(store: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_config(ClientConfig::default(), store)
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(&config.base_url)?,
            store,
            policy: config.refresh,
            refresh_lock: Arc::new(Mutex::new(None)),
        })
    }

    /// Token store shared with the sign-in flow
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Build full URL for an endpoint relative to the base URL
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build an unauthenticated request builder. Pass it to [`send`](Self::send)
    /// to run it through the token stages.
    pub fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Authorize, send and post-process a request.
    ///
    /// Non-2xx responses are returned as-is; use [`send_json`](Self::send_json)
    /// to turn them into errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse> {
        let authorization = self.authorize().await?;
        debug!(refresh = ?authorization.refresh, "request authorized");
        let builder = match &authorization.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        self.dispatch(builder).await
    }

    /// Send through the token stages and decode a successful JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.send(builder).await?.into_json()
    }

    /// GET an endpoint and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let builder = self.request(Method::GET, endpoint)?;
        self.send_json(builder).await
    }

    /// Execute without the request stage; the response stage still runs.
    pub(crate) async fn dispatch(&self, builder: RequestBuilder) -> Result<ApiResponse> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.http_client.execute(request).await?;
        let response = ApiResponse::read(url, response).await?;
        debug!(%method, url = %response.url(), status = %response.status(), "request completed");

        self.capture_tokens(&response).await?;
        Ok(response)
    }

    /// Plain execution with neither stage, for the inline refresh exchange
    pub(crate) async fn execute_raw(&self, builder: RequestBuilder) -> Result<ApiResponse> {
        let request = builder.build()?;
        let url = request.url().clone();
        let response = self.http_client.execute(request).await?;
        ApiResponse::read(url, response).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends with '/'
    if raw.ends_with('/') {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("{raw}/"))?)
    }
}
