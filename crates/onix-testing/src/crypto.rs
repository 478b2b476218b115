//! Deterministic, dependency-free stand-ins for the `onix-api::crypto` ports.
//!
//! These are *not* cryptographically meaningful — they exist so unit tests
//! can exercise the auth pipeline and the admin challenge/response handshake
//! without pulling in `ed25519-dalek`/`x25519-dalek` or paying for real key
//! generation. `onix-crypto`'s own tests cover the real Ed25519/X25519
//! implementations; these fakes cover everything built *on top* of the
//! `Signer`/`SignValidator`/`Encryptor`/`Decrypter` traits.

use async_trait::async_trait;
use onix_api::crypto::{CryptoError, Decrypter, Encryptor, SignValidator, Signer};
use onix_api::ports::KeyManager;
use std::sync::Arc;

/// A keyed FNV-1a style checksum: cheap, deterministic, and sensitive to
/// every input byte, which is all a fake signature needs to be.
fn keyed_checksum(secret: &str, message: &[u8]) -> String {
    let mut acc: u64 = 0xcbf29ce484222325;
    for byte in secret.as_bytes().iter().chain(message.iter()) {
        acc ^= *byte as u64;
        acc = acc.wrapping_mul(0x100000001b3);
    }
    format!("{acc:016x}")
}

/// Signs by hashing `(signing_private, message)`; only valid against a
/// [`FakeSignValidator`] holding the matching public half (which, in this
/// fake key scheme, is the same string as the private half).
pub struct FakeSigner {
    keys: Arc<dyn KeyManager>,
}

impl FakeSigner {
    pub fn new(keys: Arc<dyn KeyManager>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<String, CryptoError> {
        let keyset = self
            .keys
            .get_keyset(key_id)
            .await
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(keyed_checksum(&keyset.signing_private, message))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FakeSignValidator;

#[async_trait]
impl SignValidator for FakeSignValidator {
    async fn verify(&self, public_key: &str, message: &[u8], signature: &str) -> Result<(), CryptoError> {
        if keyed_checksum(public_key, message) == signature {
            Ok(())
        } else {
            Err(CryptoError::VerificationFailed)
        }
    }
}

const SEAL_PREFIX: &str = "fake-sealed";

/// "Encrypts" by tagging the plaintext with the recipient's public key;
/// [`FakeDecrypter`] only opens a tag that matches the resolved keyset.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeEncryptor;

#[async_trait]
impl Encryptor for FakeEncryptor {
    async fn encrypt(&self, recipient_public_key: &str, plaintext: &[u8]) -> Result<String, CryptoError> {
        let plaintext = String::from_utf8(plaintext.to_vec())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(format!("{SEAL_PREFIX}:{recipient_public_key}:{plaintext}"))
    }
}

pub struct FakeDecrypter {
    keys: Arc<dyn KeyManager>,
}

impl FakeDecrypter {
    pub fn new(keys: Arc<dyn KeyManager>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl Decrypter for FakeDecrypter {
    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let keyset = self
            .keys
            .get_keyset(key_id)
            .await
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let prefix = format!("{SEAL_PREFIX}:{}:", keyset.encr_private);
        ciphertext
            .strip_prefix(&prefix)
            .map(|plaintext| plaintext.as_bytes().to_vec())
            .ok_or(CryptoError::DecryptionFailed)
    }
}
