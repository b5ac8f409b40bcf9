/*
[INPUT]:  Connected wallet (if any), cancellation token and HTTP client
[OUTPUT]: Token pair issued for the wallet, already persisted in the store
[POS]:    Auth layer - orchestrates the wallet sign-in flow
[UPDATE]: When login message, payload or flow steps change
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::http::{Result, SandwatchClient, SandwatchError};
use crate::types::{AccessTokenRequest, TokenPair};

use super::WalletSigner;

/// Fixed message every wallet signs to log in
pub const LOGIN_MESSAGE: &str = "Log in to Sandwatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInState {
    Idle,
    Signing,
}

/// Wallet sign-in flow.
///
/// Success and failure both end in [`SignInState::Idle`]; whether the user is
/// logged in is read from the token store, not tracked here.
#[derive(Debug, Clone)]
pub struct SignInFlow {
    client: SandwatchClient,
    signing: Arc<AtomicBool>,
}

impl SignInFlow {
    pub fn new(client: SandwatchClient) -> Self {
        Self {
            client,
            signing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn client(&self) -> &SandwatchClient {
        &self.client
    }

    pub fn state(&self) -> SignInState {
        if self.signing.load(Ordering::SeqCst) {
            SignInState::Signing
        } else {
            SignInState::Idle
        }
    }

    /// Sign in without a way to abort the wallet prompt
    pub async fn sign_in(&self, wallet: Option<&dyn WalletSigner>) -> Result<TokenPair> {
        self.sign_in_with_cancel(wallet, &CancellationToken::new())
            .await
    }

    /// Complete sign-in flow
    ///
    /// 1. Fail with `NotConnected` when no wallet is given
    /// 2. Ask the wallet to sign [`LOGIN_MESSAGE`] (aborted by `cancel`)
    /// 3. POST the base58 signature and public key to `/auth/access_token`
    ///
    /// Failures are logged and returned; the flow is back to idle either way.
    pub async fn sign_in_with_cancel(
        &self,
        wallet: Option<&dyn WalletSigner>,
        cancel: &CancellationToken,
    ) -> Result<TokenPair> {
        let Some(wallet) = wallet else {
            warn!("sign-in attempted without a connected wallet");
            return Err(SandwatchError::NotConnected);
        };

        let _signing = SigningGuard::enter(&self.signing)?;

        let result = self.sign_and_submit(wallet, cancel).await;
        match &result {
            Ok(_) => debug!(address = wallet.address(), "sign-in complete"),
            Err(err) => warn!(address = wallet.address(), error = %err, "sign-in failed"),
        }
        result
    }

    async fn sign_and_submit(
        &self,
        wallet: &dyn WalletSigner,
        cancel: &CancellationToken,
    ) -> Result<TokenPair> {
        debug!(address = wallet.address(), "requesting login signature");

        // No timeout: the wallet waits on a human
        let signature = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SandwatchError::Cancelled),
            signature = wallet.sign_message(LOGIN_MESSAGE.as_bytes()) => signature?,
        };

        let request = AccessTokenRequest {
            signed_message: bs58::encode(signature).into_string(),
            public_key: wallet.address().to_string(),
        };

        self.client.request_access_token(&request).await
    }
}

/// Holds the flow in `Signing`; dropping it returns to `Idle`
struct SigningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SigningGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SandwatchError::SignInInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SigningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
