//! Ed25519 implementations of the [`onix_api::crypto::Signer`] and
//! [`onix_api::crypto::SignValidator`] ports.

use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use onix_api::crypto::{CryptoError, SignValidator, Signer};
use onix_api::ports::KeyManager;

/// Decodes a base64-encoded 32-byte Ed25519 signing key seed.
fn decode_signing_key(b64: &str) -> Result<SigningKey, CryptoError> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey("signing key must be 32 bytes".into()))?;
    Ok(SigningKey::from_bytes(&bytes))
}

fn decode_verifying_key(b64: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey("verifying key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::MalformedKey(e.to_string()))
}

fn decode_signature(b64: &str) -> Result<Signature, CryptoError> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let bytes: [u8; 64] = bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey("signature must be 64 bytes".into()))?;
    Ok(Signature::from_bytes(&bytes))
}

/// Signs on behalf of locally-custodied keys, resolving `key_id` to a
/// signing private key through a [`KeyManager`].
pub struct Ed25519Signer {
    keys: Arc<dyn KeyManager>,
}

impl Ed25519Signer {
    pub fn new(keys: Arc<dyn KeyManager>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl Signer for Ed25519Signer {
    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<String, CryptoError> {
        let keyset = self
            .keys
            .get_keyset(key_id)
            .await
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let signing_key = decode_signing_key(&keyset.signing_private)?;
        let signature = signing_key.sign(message);
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            signature.to_bytes(),
        ))
    }
}

/// Verifies a signature against a caller-supplied public key with no key
/// custody of its own (used to verify an NP's request signature against the
/// signing key the lookup call returned for it).
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Validator;

#[async_trait]
impl SignValidator for Ed25519Validator {
    async fn verify(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &str,
    ) -> Result<(), CryptoError> {
        let verifying_key = decode_verifying_key(public_key)?;
        let signature = decode_signature(signature)?;
        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}
