//! Signing, verification, and asymmetric encryption/decryption ports used by
//! the challenge-response handshake and by the request-signing pipeline.

use async_trait::async_trait;
use onix_types::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed key material: {0}")]
    MalformedKey(String),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("signing operation failed: {0}")]
    SigningFailed(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            CryptoError::MalformedKey(_) => "CRYPTO_MALFORMED_KEY",
            CryptoError::VerificationFailed => "CRYPTO_VERIFICATION_FAILED",
            CryptoError::DecryptionFailed => "CRYPTO_DECRYPTION_FAILED",
            CryptoError::SigningFailed(_) => "CRYPTO_SIGNING_FAILED",
        }
    }
}

/// Signs a message digest with a private key held in base64/hex wire form.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Returns a base64-encoded signature over `message` using the signing
    /// private key identified by `key_id`.
    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<String, CryptoError>;
}

/// Verifies a signature against a caller-supplied public key, independent of
/// any local key custody (used to verify an NP's signature against the key
/// material returned by a lookup call).
#[async_trait]
pub trait SignValidator: Send + Sync {
    /// Verifies `signature` (base64) over `message` using `public_key`
    /// (base64).
    async fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &str,
    ) -> Result<(), CryptoError>;
}

/// Encrypts a plaintext to a recipient's encryption public key (used to seal
/// the challenge answer to the NP's `encr_public_key`).
#[async_trait]
pub trait Encryptor: Send + Sync {
    /// Returns a base64-encoded ciphertext of `plaintext`, sealed to
    /// `recipient_public_key` (base64).
    async fn encrypt(
        &self,
        recipient_public_key: &str,
        plaintext: &[u8],
    ) -> Result<String, CryptoError>;
}

/// Decrypts a ciphertext sealed to a private key held by this node.
#[async_trait]
pub trait Decrypter: Send + Sync {
    /// Returns the plaintext bytes of `ciphertext` (base64), decrypted with
    /// the encryption private key identified by `key_id`.
    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CryptoError>;
}
