//! An in-memory [`KeyManager`] fake: generates symmetric "fake" key material
//! (public and private halves are the same opaque token) so it pairs with
//! [`crate::crypto`]'s fakes without pulling in real asymmetric crypto.

use async_trait::async_trait;
use dashmap::DashMap;
use onix_api::ports::{KeyManager, KeyManagerError};
use onix_types::Keyset;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryKeyManager {
    by_key_id: DashMap<String, Keyset>,
    active_by_subscriber: DashMap<String, String>,
    staged_by_message_id: DashMap<String, Keyset>,
}

impl InMemoryKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: insert a fully-formed keyset and mark it active for its
    /// subscriber.
    pub fn seed(&self, keyset: Keyset) {
        self.active_by_subscriber
            .insert(keyset.subscriber_id.clone(), keyset.unique_key_id.clone());
        self.by_key_id.insert(keyset.unique_key_id.clone(), keyset);
    }
}

#[async_trait]
impl KeyManager for InMemoryKeyManager {
    async fn generate_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError> {
        let key_id = Uuid::new_v4().to_string();
        let signing_token = format!("signing-{}", Uuid::new_v4());
        let encr_token = format!("encr-{}", Uuid::new_v4());
        let keyset = Keyset::new(
            key_id.clone(),
            subscriber_id,
            signing_token.clone(),
            signing_token,
            encr_token.clone(),
            encr_token,
        );
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
        if let Some((_, mut keyset)) = self.by_key_id.remove(key_id) {
            keyset.valid = false;
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
