//! An in-memory [`KeyManager`] backed by real Ed25519 signing keypairs and
//! X25519 encryption keypairs, for deployments that have not yet wired a
//! cloud secret store (§1: "Concrete key store (in-memory + cloud secret
//! store + Beckn registry lookup) ... consumed via a `KeyManager`
//! interface"). This is the in-memory variant of that trio: real key
//! material, no persistence across restarts.
//!
//! Distinct from `onix_testing::InMemoryKeyManager`, which stores opaque
//! matching tokens instead of real keys so unit tests can stay independent
//! of any asymmetric crypto library.

use async_trait::async_trait;
use base64::Engine;
use dashmap::DashMap;
use ed25519_dalek::SigningKey;
use onix_api::ports::{KeyManager, KeyManagerError};
use onix_types::Keyset;
use rand::rngs::OsRng;
use uuid::Uuid;
use x25519_dalek::{PublicKey, StaticSecret};

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn generate_keyset(subscriber_id: &str) -> Keyset {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    let encr_secret = StaticSecret::random_from_rng(OsRng);
    let encr_public = PublicKey::from(&encr_secret);

    Keyset::new(
        Uuid::new_v4().to_string(),
        subscriber_id,
        b64(verifying_key.as_bytes()),
        b64(signing_key.to_bytes().as_slice()),
        b64(encr_public.as_bytes()),
        b64(encr_secret.to_bytes().as_slice()),
    )
}

/// Real-key in-memory custody: signing/encryption keypairs indexed by
/// `unique_key_id`, the active key per `subscriber_id`, and a staging area
/// for keysets generated ahead of registry approval (§4.J).
#[derive(Default)]
pub struct GeneratingKeyManager {
    by_key_id: DashMap<String, Keyset>,
    active_by_subscriber: DashMap<String, String>,
    staged_by_message_id: DashMap<String, Keyset>,
}

impl GeneratingKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn seed(&self, keyset: Keyset) {
        self.active_by_subscriber
            .insert(keyset.subscriber_id.clone(), keyset.unique_key_id.clone());
        self.by_key_id.insert(keyset.unique_key_id.clone(), keyset);
    }
}

#[async_trait]
impl KeyManager for GeneratingKeyManager {
    async fn generate_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
        let keyset = generate_keyset(subscriber_id);
        self.seed(keyset.clone());
        Ok(keyset)
    }

    async fn get_keyset(&self, key_id: &str) -> Result<Keyset, KeyManagerError> {
        self.by_key_id
            .get(key_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| KeyManagerError::NotFound(key_id.to_string()))
    }

    async fn get_active_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
        let key_id = self
            .active_by_subscriber
            .get(subscriber_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| KeyManagerError::NotFound(subscriber_id.to_string()))?;
        self.get_keyset(&key_id).await
    }

    async fn invalidate_keyset(&self, key_id: &str) -> Result<(), KeyManagerError> {
        if let Some(mut entry) = self.by_key_id.get_mut(key_id) {
            entry.valid = false;
            Ok(())
        } else {
            Err(KeyManagerError::NotFound(key_id.to_string()))
        }
    }

    async fn lookup_np_keys(&self, _subscriber_id: &str, key_id: &str) -> Result<Keyset, KeyManagerError> {
        let mut keyset = self.get_keyset(key_id).await?;
        keyset.signing_private.clear();
        keyset.encr_private.clear();
        Ok(keyset)
    }

    async fn stage_keyset(&self, message_id: &str, keyset: Keyset) -> Result<(), KeyManagerError> {
        self.staged_by_message_id.insert(message_id.to_string(), keyset);
        Ok(())
    }

    async fn get_staged_keyset(&self, message_id: &str) -> Result<Keyset, KeyManagerError> {
        self.staged_by_message_id
            .get(message_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| KeyManagerError::NotFound(message_id.to_string()))
    }

    async fn promote_staged_keyset(&self, message_id: &str, subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
        let (_, mut keyset) = self
            .staged_by_message_id
            .remove(message_id)
            .ok_or_else(|| KeyManagerError::NotFound(message_id.to_string()))?;
        keyset.subscriber_id = subscriber_id.to_string();
        self.seed(keyset.clone());
        Ok(keyset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_keys_are_valid_base64_of_the_expected_length() {
        let manager = GeneratingKeyManager::new();
        let keyset = manager.generate_keyset("sub-1").await.unwrap();

        let signing_public = base64::engine::general_purpose::STANDARD.decode(&keyset.signing_public).unwrap();
        assert_eq!(signing_public.len(), 32);
        let encr_public = base64::engine::general_purpose::STANDARD.decode(&keyset.encr_public).unwrap();
        assert_eq!(encr_public.len(), 32);
    }

    #[tokio::test]
    async fn staged_keyset_promotes_under_the_new_subscriber_id() {
        let manager = GeneratingKeyManager::new();
        let keyset = manager.generate_keyset("tmp").await.unwrap();
        manager.stage_keyset("msg-1", keyset.clone()).await.unwrap();

        let promoted = manager.promote_staged_keyset("msg-1", "bap1").await.unwrap();
        assert_eq!(promoted.subscriber_id, "bap1");
        assert!(manager.get_active_keyset("bap1").await.is_ok());
        assert!(manager.get_staged_keyset("msg-1").await.is_err());
    }
}
