//! Authenticated-request verification: the subscription-side verifier (keys
//! resolved from the local repository) and the transaction-side verifier
//! (keys resolved via a network-registry lookup).

use std::sync::Arc;

use onix_api::crypto::SignValidator;
use onix_api::ports::{RegistryClient, RegistryRepository};
use onix_types::subscription::SubscriptionFilter;
use onix_types::SubscriptionRequest;

use crate::error::AuthError;
use crate::header;

fn signed_message(body: &[u8], created: i64, expires: i64) -> Vec<u8> {
    let mut message = Vec::with_capacity(body.len() + 32);
    message.extend_from_slice(body);
    message.extend_from_slice(created.to_string().as_bytes());
    message.extend_from_slice(expires.to_string().as_bytes());
    message
}

/// Verifies `POST`/`PATCH /subscribe` requests against the registry's own
/// subscription records.
pub struct SubscriptionAuthenticator {
    repository: Arc<dyn RegistryRepository>,
    validator: Arc<dyn SignValidator>,
}

impl SubscriptionAuthenticator {
    pub fn new(repository: Arc<dyn RegistryRepository>, validator: Arc<dyn SignValidator>) -> Self {
        Self {
            repository,
            validator,
        }
    }

    /// Runs the full six-step verification algorithm and returns the parsed
    /// request body on success.
    pub async fn authenticate(
        &self,
        body: &[u8],
        authorization: Option<&str>,
    ) -> Result<SubscriptionRequest, AuthError> {
        let raw = authorization
            .filter(|h| !h.is_empty())
            .ok_or_else(AuthError::missing_header)?;

        let parsed = header::parse(raw)?;

        let request: SubscriptionRequest =
            serde_json::from_slice(body).map_err(|e| AuthError::invalid_json(e.to_string()))?;

        let header_subscriber_id = parsed
            .subscriber_id()
            .ok_or_else(AuthError::id_mismatch)?;
        if header_subscriber_id != request.subscriber_id {
            return Err(AuthError::id_mismatch().with_subscriber_hint(&request.subscriber_id));
        }

        let unique_key_id = parsed.unique_key_id().ok_or_else(AuthError::id_mismatch)?;

        let subscription = self
            .repository
            .get_subscription(&request.subscriber_id, &request.domain, request.role, unique_key_id)
            .await
            .map_err(|_| AuthError::key_unavailable("repository lookup failed"))?
            .ok_or_else(AuthError::subscription_not_found)?;

        let message = signed_message(body, parsed.created, parsed.expires);
        self.validator
            .verify(&subscription.signing_public_key, &message, &parsed.signature)
            .await
            .map_err(|_| AuthError::invalid_signature().with_subscriber_hint(&request.subscriber_id))?;

        Ok(request)
    }
}

/// Verifies transaction traffic (e.g. `/search`, `/on_search`) whose signing
/// key must be resolved from the network registry, not the local DB.
pub struct TransactionAuthenticator {
    registry_client: Arc<dyn RegistryClient>,
    validator: Arc<dyn SignValidator>,
}

impl TransactionAuthenticator {
    pub fn new(registry_client: Arc<dyn RegistryClient>, validator: Arc<dyn SignValidator>) -> Self {
        Self {
            registry_client,
            validator,
        }
    }

    pub async fn authenticate(&self, body: &[u8], authorization: Option<&str>) -> Result<(), AuthError> {
        let raw = authorization
            .filter(|h| !h.is_empty())
            .ok_or_else(AuthError::missing_header)?;

        let parsed = header::parse(raw)?;
        let subscriber_id = parsed
            .subscriber_id()
            .ok_or_else(AuthError::id_mismatch)?
            .to_string();
        let unique_key_id = parsed
            .unique_key_id()
            .ok_or_else(AuthError::id_mismatch)?
            .to_string();

        let filter = SubscriptionFilter {
            subscriber_id: Some(subscriber_id.clone()),
            ..Default::default()
        };
        let matches = self
            .registry_client
            .lookup(&filter)
            .await
            .map_err(|e| AuthError::key_unavailable(e.to_string()))?;

        let subscription = matches
            .into_iter()
            .find(|s| s.key_id == unique_key_id)
            .ok_or_else(AuthError::subscription_not_found)?;

        let message = signed_message(body, parsed.created, parsed.expires);
        self.validator
            .verify(&subscription.signing_public_key, &message, &parsed.signature)
            .await
            .map_err(|_| AuthError::invalid_signature().with_subscriber_hint(&subscriber_id))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authgen::AuthGen;
    use onix_api::ports::KeyManager;
    use onix_testing::{FakeSignValidator, FakeSigner, InMemoryKeyManager, InMemoryRegistryRepository, ScriptedRegistryClient};
    use onix_types::subscriber::Role;
    use onix_types::SubscriptionStatus;
    use time::OffsetDateTime;

    fn request() -> SubscriptionRequest {
        SubscriptionRequest {
            message_id: "op1".into(),
            subscriber_id: "bap1".into(),
            domain: "retail".into(),
            role: Role::Bap,
            url: "http://bap1/cb".into(),
            unique_key_id: "k1".into(),
            signing_public_key: String::new(),
            encr_public_key: String::new(),
            location: None,
            valid_from: None,
            valid_until: None,
        }
    }

    async fn seeded() -> (Arc<InMemoryRegistryRepository>, Arc<InMemoryKeyManager>) {
        let keys = Arc::new(InMemoryKeyManager::new());
        let keyset = keys.generate_keyset("bap1").await.unwrap();

        let repository = Arc::new(InMemoryRegistryRepository::new());
        let now = OffsetDateTime::now_utc();
        let subscription = onix_types::Subscription::new(
            "bap1",
            "retail",
            Role::Bap,
            keyset.unique_key_id.clone(),
            keyset.signing_public.clone(),
            "encr-pub",
            "http://bap1/cb",
            None,
            now,
            now + time::Duration::days(365),
            SubscriptionStatus::Subscribed,
            "nonce",
            now,
        )
        .unwrap();
        repository.seed_subscription(subscription);

        (repository, keys)
    }

    #[tokio::test]
    async fn missing_authorization_header_is_rejected() {
        let (repository, _keys) = seeded().await;
        let authenticator = SubscriptionAuthenticator::new(repository, Arc::new(FakeSignValidator));
        let err = authenticator.authenticate(b"{}", None).await.unwrap_err();
        assert_eq!(err.code, "MISSING_HEADER");
        assert_eq!(err.status, 401);
    }

    #[tokio::test]
    async fn valid_signature_round_trips_through_authgen() {
        let (repository, keys) = seeded().await;
        let body = serde_json::to_vec(&request()).unwrap();
        let auth_gen = AuthGen::new(keys.clone(), Arc::new(FakeSigner::new(keys)));
        let authorization = auth_gen.auth_header(&body, "bap1").await.unwrap();

        let authenticator = SubscriptionAuthenticator::new(repository, Arc::new(FakeSignValidator));
        let parsed = authenticator.authenticate(&body, Some(&authorization)).await.unwrap();
        assert_eq!(parsed.subscriber_id, "bap1");
    }

    #[tokio::test]
    async fn header_subscriber_id_mismatch_is_rejected_with_hint() {
        let (repository, keys) = seeded().await;
        let mut req = request();
        req.subscriber_id = "mallory".into();
        let body = serde_json::to_vec(&req).unwrap();
        let auth_gen = AuthGen::new(keys.clone(), Arc::new(FakeSigner::new(keys)));
        // Sign on behalf of "bap1" (the only registered keyset) but the body
        // claims a different subscriber_id, reproducing S6.
        let authorization = auth_gen.auth_header(&body, "bap1").await.unwrap();

        let authenticator = SubscriptionAuthenticator::new(repository, Arc::new(FakeSignValidator));
        let err = authenticator.authenticate(&body, Some(&authorization)).await.unwrap_err();
        assert_eq!(err.code, "ID_MISMATCH");
        assert_eq!(err.subscriber_id_hint.as_deref(), Some("mallory"));
    }

    #[tokio::test]
    async fn unregistered_subscription_is_not_found() {
        let repository = Arc::new(InMemoryRegistryRepository::new());
        let keys = Arc::new(InMemoryKeyManager::new());
        keys.generate_keyset("bap1").await.unwrap();
        let body = serde_json::to_vec(&request()).unwrap();
        let auth_gen = AuthGen::new(keys.clone(), Arc::new(FakeSigner::new(keys)));
        let authorization = auth_gen.auth_header(&body, "bap1").await.unwrap();

        let authenticator = SubscriptionAuthenticator::new(repository, Arc::new(FakeSignValidator));
        let err = authenticator.authenticate(&body, Some(&authorization)).await.unwrap_err();
        assert_eq!(err.code, "SUBSCRIPTION_NOT_FOUND");
    }

    #[tokio::test]
    async fn transaction_authenticator_verifies_against_registry_lookup() {
        let keys = Arc::new(InMemoryKeyManager::new());
        let keyset = keys.generate_keyset("bap1").await.unwrap();
        let now = OffsetDateTime::now_utc();
        let subscription = onix_types::Subscription::new(
            "bap1",
            "retail",
            Role::Bap,
            keyset.unique_key_id.clone(),
            keyset.signing_public.clone(),
            "encr-pub",
            "http://bap1/cb",
            None,
            now,
            now + time::Duration::days(365),
            SubscriptionStatus::Subscribed,
            "nonce",
            now,
        )
        .unwrap();
        let registry_client = Arc::new(ScriptedRegistryClient::new().with_lookup_results(vec![subscription]));

        let body = b"{\"context\":{}}";
        let auth_gen = AuthGen::new(keys.clone(), Arc::new(FakeSigner::new(keys)));
        let authorization = auth_gen.auth_header(body, "bap1").await.unwrap();

        let authenticator = TransactionAuthenticator::new(registry_client, Arc::new(FakeSignValidator));
        authenticator.authenticate(body, Some(&authorization)).await.unwrap();
    }
}
