/*
[INPUT]:  Message bytes and optional secret key bytes
[OUTPUT]: Ed25519 signatures and base58-encoded public keys
[POS]:    Auth layer - key material behind the Solana wallet signer
[UPDATE]: When changing signing algorithm or key format
*/

use bs58;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::http::{Result, SandwatchError};

/// Ed25519 keypair
#[derive(Debug)]
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create signer from existing secret key bytes (32 bytes)
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        Self { signing_key }
    }

    /// Create signer from a 64-byte `secret || public` keypair.
    ///
    /// Fails if the public half does not match the secret half.
    pub fn from_keypair_bytes(bytes: &[u8; 64]) -> Result<Self> {
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| SandwatchError::Config(format!("Invalid keypair bytes: {e}")))?;
        Ok(Self { signing_key })
    }

    /// Sign a message and return the signature
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Get the public key in base58 encoding (the Solana address)
    pub fn public_key_base58(&self) -> String {
        let verifying_key = self.signing_key.verifying_key();
        bs58::encode(verifying_key.as_bytes()).into_string()
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Get the raw secret key bytes
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Verify a signature against a message
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }
}

/// Verify a base58 signature against a base58 address, as the auth backend does.
pub fn verify_base58(address: &str, message: &[u8], signature_base58: &str) -> bool {
    let Ok(public_key) = bs58::decode(address).into_vec() else {
        return false;
    };
    let Ok(signature) = bs58::decode(signature_base58).into_vec() else {
        return false;
    };
    let Ok(public_key) = <[u8; 32]>::try_from(public_key.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&signature) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}
