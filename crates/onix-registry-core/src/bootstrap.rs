//! §4.I — self-registration: on startup the registry ensures it holds its
//! own keyset and a `SUBSCRIBED` row for itself, so that subscribers can
//! resolve the registry's own encryption key the same way they resolve any
//! other participant's (via `KeyManager::lookup_np_keys`).

use std::sync::Arc;

use onix_api::ports::{KeyManager, KeyManagerError, RegistryRepository};
use onix_types::subscriber::Role;
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Subscription, SubscriptionStatus};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::BootstrapError;

const SELF_VALIDITY_YEARS: i64 = 100;

pub struct SelfRegistration {
    repository: Arc<dyn RegistryRepository>,
    keys: Arc<dyn KeyManager>,
    registry_subscriber_id: String,
    registry_domain: String,
    registry_url: String,
}

impl SelfRegistration {
    pub fn new(
        repository: Arc<dyn RegistryRepository>,
        keys: Arc<dyn KeyManager>,
        registry_subscriber_id: impl Into<String>,
        registry_domain: impl Into<String>,
        registry_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            keys,
            registry_subscriber_id: registry_subscriber_id.into(),
            registry_domain: registry_domain.into(),
            registry_url: registry_url.into(),
        }
    }

    /// Idempotent: a second call against an already-bootstrapped registry
    /// finds its existing keyset and subscription row and does nothing.
    pub async fn ensure_bootstrapped(&self) -> Result<(), BootstrapError> {
        let keyset = match self.keys.get_active_keyset(&self.registry_subscriber_id).await {
            Ok(keyset) => keyset,
            Err(KeyManagerError::NotFound(_)) => self
                .keys
                .generate_keyset(&self.registry_subscriber_id)
                .await
                .map_err(|e| BootstrapError::KeyManager(e.to_string()))?,
            Err(e) => return Err(BootstrapError::KeyManager(e.to_string())),
        };

        let filter = SubscriptionFilter {
            subscriber_id: Some(self.registry_subscriber_id.clone()),
            domain: Some(self.registry_domain.clone()),
            role: Some(Role::Registry),
            location: None,
        };
        let existing = self
            .repository
            .lookup_subscriptions(&filter)
            .await
            .map_err(|e| BootstrapError::Repository(e.to_string()))?;
        if !existing.is_empty() {
            return Ok(());
        }

        let now = OffsetDateTime::now_utc();
        let subscription = Subscription::new(
            self.registry_subscriber_id.clone(),
            self.registry_domain.clone(),
            Role::Registry,
            keyset.unique_key_id.clone(),
            keyset.signing_public.clone(),
            keyset.encr_public.clone(),
            self.registry_url.clone(),
            None,
            now,
            now + time::Duration::days(365 * SELF_VALIDITY_YEARS),
            SubscriptionStatus::Subscribed,
            Uuid::new_v4().to_string(),
            now,
        )
        .map_err(|e| BootstrapError::Repository(e.to_string()))?;

        self.repository
            .update_subscription(subscription)
            .await
            .map_err(|e| BootstrapError::Repository(e.to_string()))
    }
}
