/*
[INPUT]:  HTTP client configuration, token store and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod connections;
pub mod error;
pub mod interceptor;
pub mod response;
pub mod tokens;

pub use error::{Result, SandwatchError};
pub use response::ApiResponse;

pub use client::{ClientConfig, DEFAULT_BASE_URL, RefreshPolicy, SandwatchClient};
pub use interceptor::{Authorization, RefreshOutcome, is_auth_endpoint};
