/*
[INPUT]:  Message bytes to sign
[OUTPUT]: Raw signature bytes and the wallet address
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding new wallet types or changing signature format
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::http::{Result, SandwatchError};

/// Trait for wallet signing operations
///
/// The trait is async because signing usually waits on the user approving
/// the request in an external wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Get the wallet address (base58 public key)
    fn address(&self) -> &str;

    /// Sign raw message bytes and return the raw signature bytes
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    address: String,
    signature: Vec<u8>,
    reject: bool,
    calls: Arc<AtomicUsize>,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(address: &str, signature: &[u8]) -> Self {
        Self {
            address: address.to_string(),
            signature: signature.to_vec(),
            reject: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock signer that refuses every request, like a user clicking "reject"
    pub fn rejecting(address: &str) -> Self {
        Self {
            reject: true,
            ..Self::new(address, &[])
        }
    }

    /// Number of signature requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(SandwatchError::Wallet("User rejected the request.".to_string()));
        }
        Ok(self.signature.clone())
    }
}
