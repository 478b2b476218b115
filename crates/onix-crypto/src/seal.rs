//! X25519 + ChaCha20-Poly1305 implementations of the [`onix_api::crypto::Encryptor`]
//! and [`onix_api::crypto::Decrypter`] ports: an anonymous sealed-box
//! construction used to encrypt the handshake challenge to a subscriber's
//! `encr_public_key` without either side needing a shared session.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use onix_api::crypto::{CryptoError, Decrypter, Encryptor};
use onix_api::ports::KeyManager;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

const NONCE_LEN: usize = 12;

fn decode_public(b64: &str) -> Result<PublicKey, CryptoError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey("x25519 public key must be 32 bytes".into()))?;
    Ok(PublicKey::from(bytes))
}

fn decode_secret(b64: &str) -> Result<StaticSecret, CryptoError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey("x25519 private key must be 32 bytes".into()))?;
    Ok(StaticSecret::from(bytes))
}

/// Derives a 256-bit symmetric key from a raw Diffie-Hellman shared secret.
fn derive_symmetric_key(shared_secret: &x25519_dalek::SharedSecret) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(shared_secret.as_bytes());
    hasher.finalize().into()
}

/// Encrypts with an ephemeral X25519 keypair discarded after use; the
/// ciphertext carries the ephemeral public key and nonce so the recipient
/// can rederive the shared secret with no prior session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SealedBoxEncryptor;

#[async_trait]
impl Encryptor for SealedBoxEncryptor {
    async fn encrypt(
        &self,
        recipient_public_key: &str,
        plaintext: &[u8],
    ) -> Result<String, CryptoError> {
        let recipient_public = decode_public(recipient_public_key)?;
        let ephemeral_secret = StaticSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral_secret);
        let shared_secret = ephemeral_secret.diffie_hellman(&recipient_public);
        let key = derive_symmetric_key(&shared_secret);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = ChaCha20Poly1305::new(key.as_slice().into());
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::SigningFailed("sealed box encryption failed".into()))?;

        let mut sealed = Vec::with_capacity(32 + NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(ephemeral_public.as_bytes());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(sealed))
    }
}

/// Decrypts a [`SealedBoxEncryptor`] ciphertext, resolving `key_id` to the
/// recipient's X25519 private key through a [`KeyManager`].
pub struct SealedBoxDecrypter {
    keys: Arc<dyn KeyManager>,
}

impl SealedBoxDecrypter {
    pub fn new(keys: Arc<dyn KeyManager>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl Decrypter for SealedBoxDecrypter {
    async fn decrypt(&self, key_id: &str, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let keyset = self
            .keys
            .get_keyset(key_id)
            .await
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let secret = decode_secret(&keyset.encr_private)?;

        let sealed = base64::engine::general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
        if sealed.len() < 32 + NONCE_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let (ephemeral_public_bytes, rest) = sealed.split_at(32);
        let (nonce_bytes, ciphertext_bytes) = rest.split_at(NONCE_LEN);

        let ephemeral_public_bytes: [u8; 32] = ephemeral_public_bytes
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;
        let ephemeral_public = PublicKey::from(ephemeral_public_bytes);

        let shared_secret = secret.diffie_hellman(&ephemeral_public);
        let key = derive_symmetric_key(&shared_secret);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = ChaCha20Poly1305::new(key.as_slice().into());
        cipher
            .decrypt(nonce, ciphertext_bytes)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onix_api::ports::KeyManagerError;
    use onix_types::Keyset;

    struct SingleKeyManager(Keyset);

    #[async_trait]
    impl KeyManager for SingleKeyManager {
        async fn generate_keyset(&self, _subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
            Ok(self.0.clone())
        }

        async fn get_keyset(&self, key_id: &str) -> Result<Keyset, KeyManagerError> {
            if key_id == self.0.unique_key_id {
                Ok(self.0.clone())
            } else {
                Err(KeyManagerError::NotFound(key_id.to_string()))
            }
        }

        async fn get_active_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
            if subscriber_id == self.0.subscriber_id {
                Ok(self.0.clone())
            } else {
                Err(KeyManagerError::NotFound(subscriber_id.to_string()))
            }
        }

        async fn invalidate_keyset(&self, _key_id: &str) -> Result<(), KeyManagerError> {
            Ok(())
        }

        async fn lookup_np_keys(&self, _subscriber_id: &str, key_id: &str) -> Result<Keyset, KeyManagerError> {
            self.get_keyset(key_id).await
        }

        async fn stage_keyset(&self, _message_id: &str, _keyset: Keyset) -> Result<(), KeyManagerError> {
            Ok(())
        }

        async fn get_staged_keyset(&self, message_id: &str) -> Result<Keyset, KeyManagerError> {
            Err(KeyManagerError::NotFound(message_id.to_string()))
        }

        async fn promote_staged_keyset(&self, message_id: &str, _subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
            Err(KeyManagerError::NotFound(message_id.to_string()))
        }
    }

    fn make_keyset() -> Keyset {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Keyset::new(
            "key-1",
            "sub-1",
            "",
            "",
            base64::engine::general_purpose::STANDARD.encode(public.as_bytes()),
            base64::engine::general_purpose::STANDARD.encode(secret.to_bytes()),
        )
    }

    #[tokio::test]
    async fn seals_and_opens_round_trip() {
        let keyset = make_keyset();
        let public_key = keyset.encr_public.clone();
        let decrypter = SealedBoxDecrypter::new(Arc::new(SingleKeyManager(keyset)));
        let encryptor = SealedBoxEncryptor;

        let plaintext = b"challenge-bytes";
        let sealed = encryptor.encrypt(&public_key, plaintext).await.unwrap();
        let opened = decrypter.decrypt("key-1", &sealed).await.unwrap();

        assert_eq!(opened, plaintext);
    }

    #[tokio::test]
    async fn tampered_ciphertext_fails_to_open() {
        let keyset = make_keyset();
        let public_key = keyset.encr_public.clone();
        let decrypter = SealedBoxDecrypter::new(Arc::new(SingleKeyManager(keyset)));
        let encryptor = SealedBoxEncryptor;

        let mut sealed_bytes = base64::engine::general_purpose::STANDARD
            .decode(encryptor.encrypt(&public_key, b"hello").await.unwrap())
            .unwrap();
        let last = sealed_bytes.len() - 1;
        sealed_bytes[last] ^= 0xFF;
        let tampered = base64::engine::general_purpose::STANDARD.encode(sealed_bytes);

        let result = decrypter.decrypt("key-1", &tampered).await;
        assert!(result.is_err());
    }
}
