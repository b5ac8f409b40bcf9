/*
[INPUT]:  Solana private key (base58 or keypair JSON file) and message bytes
[OUTPUT]: Raw ed25519 signatures and base58 wallet address
[POS]:    Auth layer - Solana wallet implementation
[UPDATE]: When Solana key formats change
*/

use std::path::Path;

use async_trait::async_trait;
use bs58;

use crate::auth::signer::Ed25519Signer;
use crate::auth::wallet::WalletSigner;
use crate::http::{Result, SandwatchError};

/// Solana wallet signer backed by a local keypair
pub struct SolanaWalletSigner {
    signer: Ed25519Signer,
    address: String,
}

impl SolanaWalletSigner {
    /// Create a new Solana wallet signer from a base58-encoded private key
    /// Supports 64-byte keypair or 32-byte seed
    pub fn new(private_key_base58: &str) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58.trim())
            .into_vec()
            .map_err(|e| SandwatchError::Config(format!("Invalid base58 private key: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load a Solana CLI keypair file (JSON array of 64 bytes)
    pub fn from_keypair_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let bytes: Vec<u8> = serde_json::from_str(&content).map_err(|e| {
            SandwatchError::Config(format!("Invalid keypair file {}: {}", path.display(), e))
        })?;

        Self::from_bytes(&bytes)
    }

    pub fn from_signer(signer: Ed25519Signer) -> Self {
        let address = signer.public_key_base58();
        Self { signer, address }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let signer = if let Ok(keypair) = <&[u8; 64]>::try_from(bytes) {
            Ed25519Signer::from_keypair_bytes(keypair)?
        } else if let Ok(seed) = <&[u8; 32]>::try_from(bytes) {
            Ed25519Signer::from_secret_key(seed)
        } else {
            return Err(SandwatchError::Config(format!(
                "Invalid private key length: expected 32 or 64 bytes, got {}",
                bytes.len()
            )));
        };

        Ok(Self::from_signer(signer))
    }
}

#[async_trait]
impl WalletSigner for SolanaWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signer.sign(message).to_bytes().to_vec())
    }
}
