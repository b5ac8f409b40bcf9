/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Sandwatch auth client surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    Ed25519Signer,
    FileTokenStore,
    LOGIN_MESSAGE,
    MemoryTokenStore,
    MockWalletSigner,
    SignInFlow,
    SignInState,
    SolanaWalletSigner,
    TokenClaims,
    TokenStore,
    WalletSigner,
};

// Re-export commonly used types from http
pub use http::{
    ApiResponse,
    Authorization,
    ClientConfig,
    DEFAULT_BASE_URL,
    RefreshOutcome,
    RefreshPolicy,
    Result,
    SandwatchClient,
    SandwatchError,
};

// Re-export all types
pub use types::*;
