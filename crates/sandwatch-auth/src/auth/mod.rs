/*
[INPUT]:  Wallet signers, stored tokens and the HTTP client
[OUTPUT]: Token expiry checks, token persistence and the sign-in flow
[POS]:    Auth layer - handles Sandwatch wallet authentication
[UPDATE]: When auth flow, token storage or signature methods change
*/

pub mod jwt;
pub mod sign_in;
pub mod signer;
pub mod solana_wallet;
pub mod store;
pub mod wallet;

pub use jwt::{TokenClaims, decode_claims, is_expired, is_expired_at};
pub use sign_in::{LOGIN_MESSAGE, SignInFlow, SignInState};
pub use signer::{Ed25519Signer, verify_base58};
pub use solana_wallet::SolanaWalletSigner;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use wallet::{MockWalletSigner, WalletSigner};
