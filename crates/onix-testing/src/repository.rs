//! An in-memory [`RegistryRepository`] fake backed by `DashMap`s, for unit
//! and integration tests that don't need a real database.

use async_trait::async_trait;
use dashmap::DashMap;
use onix_api::ports::{RegistryRepository, RepositoryError};
use onix_types::subscriber::Role;
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Lro, Subscription};

fn subscription_key(subscriber_id: &str, domain: &str, role: Role, key_id: &str) -> String {
    format!("{subscriber_id}\u{1}{domain}\u{1}{role}\u{1}{key_id}")
}

#[derive(Default)]
pub struct InMemoryRegistryRepository {
    subscriptions: DashMap<String, Subscription>,
    lros: DashMap<String, Lro>,
}

impl InMemoryRegistryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: seed an LRO directly, bypassing the normal create path.
    pub fn seed_lro(&self, lro: Lro) {
        self.lros.insert(lro.operation_id.clone(), lro);
    }

    /// Test hook: seed a subscription directly.
    pub fn seed_subscription(&self, subscription: Subscription) {
        let key = subscription_key(
            &subscription.subscriber_id,
            &subscription.domain,
            subscription.role,
            &subscription.key_id,
        );
        self.subscriptions.insert(key, subscription);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait]
impl RegistryRepository for InMemoryRegistryRepository {
    async fn upsert_subscription_and_lro(
        &self,
        subscription: Subscription,
        lro: Lro,
    ) -> Result<(), RepositoryError> {
        let key = subscription_key(
            &subscription.subscriber_id,
            &subscription.domain,
            subscription.role,
            &subscription.key_id,
        );
        self.subscriptions.insert(key, subscription);
        self.lros.insert(lro.operation_id.clone(), lro);
        Ok(())
    }

    async fn get_subscription(
        &self,
        subscriber_id: &str,
        domain: &str,
        role: Role,
        key_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let key = subscription_key(subscriber_id, domain, role, key_id);
        Ok(self.subscriptions.get(&key).map(|r| r.value().clone()))
    }

    async fn lookup_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, RepositoryError> {
        let matches = self
            .subscriptions
            .iter()
            .filter(|entry| {
                let s = entry.value();
                filter
                    .subscriber_id
                    .as_deref()
                    .map(|v| v == s.subscriber_id)
                    .unwrap_or(true)
                    && filter.domain.as_deref().map(|v| v == s.domain).unwrap_or(true)
                    && filter.role.map(|v| v == s.role).unwrap_or(true)
                    && filter
                        .location
                        .as_deref()
                        .map(|v| s.location.as_deref() == Some(v))
                        .unwrap_or(true)
            })
            .map(|entry| entry.value().clone())
            .collect();
        Ok(matches)
    }

    async fn update_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError> {
        let key = subscription_key(
            &subscription.subscriber_id,
            &subscription.domain,
            subscription.role,
            &subscription.key_id,
        );
        self.subscriptions.insert(key, subscription);
        Ok(())
    }

    async fn create_lro(&self, lro: Lro) -> Result<(), RepositoryError> {
        if self.lros.contains_key(&lro.operation_id) {
            return Err(RepositoryError::OperationAlreadyExists(lro.operation_id));
        }
        self.lros.insert(lro.operation_id.clone(), lro);
        Ok(())
    }

    async fn get_lro(&self, operation_id: &str) -> Result<Lro, RepositoryError> {
        self.lros
            .get(operation_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RepositoryError::LroNotFound(operation_id.to_string()))
    }

    async fn update_lro(&self, lro: Lro) -> Result<(), RepositoryError> {
        self.lros.insert(lro.operation_id.clone(), lro);
        Ok(())
    }

    async fn list_actionable_lros(&self) -> Result<Vec<Lro>, RepositoryError> {
        use onix_types::LroStatus;
        let mut actionable: Vec<Lro> = self
            .lros
            .iter()
            .filter(|e| matches!(e.value().status, LroStatus::Pending | LroStatus::Failure))
            .map(|e| e.value().clone())
            .collect();
        actionable.sort_by_key(|l| l.created_at);
        Ok(actionable)
    }
}
