//! Persistence, key custody, event fan-out and outbound HTTP seams shared by
//! the registry and subscriber services.

use async_trait::async_trait;
use onix_types::error::ErrorCode;
use onix_types::{Keyset, Lro, Subscription};
use onix_types::subscriber::Role;
use onix_types::subscription::SubscriptionFilter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no subscription found for the given identity")]
    NotFound,
    #[error("no operation found for operation_id {0}")]
    LroNotFound(String),
    #[error("operation {0} has already reached a terminal state")]
    LroAlreadyProcessed(String),
    #[error("operation {0} already exists")]
    OperationAlreadyExists(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for RepositoryError {
    fn code(&self) -> &'static str {
        match self {
            RepositoryError::NotFound => "SUBSCRIPTION_NOT_FOUND",
            RepositoryError::LroNotFound(_) => "LRO_NOT_FOUND",
            RepositoryError::LroAlreadyProcessed(_) => "LRO_ALREADY_PROCESSED",
            RepositoryError::OperationAlreadyExists(_) => "OPERATION_ALREADY_EXISTS",
            RepositoryError::Backend(_) => "REPOSITORY_BACKEND_ERROR",
        }
    }
}

/// Persistence for Subscriptions and the LROs tracking their creation and
/// update. `upsert_subscription_and_lro` is a single trait method precisely
/// because the two writes (the draft subscription row and its governing LRO)
/// must land atomically: a caller that wrote one without the other would
/// leave an LRO with no corresponding subscription to later approve, or vice
/// versa.
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Writes `subscription` and `lro` as a single unit. Implementations
    /// that back onto a transactional store must wrap both writes in one
    /// transaction; in-memory fakes may simply write both fields under one
    /// lock.
    async fn upsert_subscription_and_lro(
        &self,
        subscription: Subscription,
        lro: Lro,
    ) -> Result<(), RepositoryError>;

    async fn get_subscription(
        &self,
        subscriber_id: &str,
        domain: &str,
        role: Role,
        key_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError>;

    async fn lookup_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, RepositoryError>;

    /// Replaces the stored subscription row matching `subscription`'s
    /// identity key (subscriber_id, domain, role, key_id).
    async fn update_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError>;

    /// Inserts a new LRO. Returns `OperationAlreadyExists` if `operation_id`
    /// is already taken — the repository is the sole enforcer of this
    /// uniqueness constraint.
    async fn create_lro(&self, lro: Lro) -> Result<(), RepositoryError>;

    async fn get_lro(&self, operation_id: &str) -> Result<Lro, RepositoryError>;

    async fn update_lro(&self, lro: Lro) -> Result<(), RepositoryError>;

    /// Returns every `PENDING` or `FAILURE` LRO, oldest first, for admin
    /// listing and for retry sweeps.
    async fn list_actionable_lros(&self) -> Result<Vec<Lro>, RepositoryError>;
}

#[derive(Debug, Error)]
pub enum KeyManagerError {
    #[error("no keyset found for key_id {0}")]
    NotFound(String),
    #[error("key manager backend error: {0}")]
    Backend(String),
}

impl ErrorCode for KeyManagerError {
    fn code(&self) -> &'static str {
        match self {
            KeyManagerError::NotFound(_) => "KEYSET_NOT_FOUND",
            KeyManagerError::Backend(_) => "KEY_MANAGER_BACKEND_ERROR",
        }
    }
}

/// Custody of signing/encryption keypairs, independent of the subscription
/// records that reference them by `unique_key_id`.
#[async_trait]
pub trait KeyManager: Send + Sync {
    async fn generate_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError>;

    async fn get_keyset(&self, key_id: &str) -> Result<Keyset, KeyManagerError>;

    /// Resolves the active keyset for a subscriber by identity rather than
    /// by `unique_key_id`, used by the signed-header generator which only
    /// knows which subscriber is signing, not which key rotation is live.
    async fn get_active_keyset(&self, subscriber_id: &str) -> Result<Keyset, KeyManagerError>;

    async fn invalidate_keyset(&self, key_id: &str) -> Result<(), KeyManagerError>;

    /// Resolves the *public* keyset of another network participant (private
    /// fields left empty) by consulting the Beckn registry rather than local
    /// custody — the "Beckn registry lookup" backing variant referenced in
    /// §1: the subscriber-side `OnSubscribe` handler uses this to resolve
    /// the Registry's own public encryption key before it decrypts a
    /// challenge it was handed.
    async fn lookup_np_keys(&self, subscriber_id: &str, key_id: &str) -> Result<Keyset, KeyManagerError>;

    /// Stages a freshly-generated keyset under `message_id` rather than
    /// under its own `unique_key_id`, so a subsequent `on_subscribe`
    /// callback — which only carries the `message_id` it was created
    /// against — can find it before the subscription is approved.
    async fn stage_keyset(&self, message_id: &str, keyset: Keyset) -> Result<(), KeyManagerError>;

    /// Looks up a keyset staged under `message_id` without consuming it.
    async fn get_staged_keyset(&self, message_id: &str) -> Result<Keyset, KeyManagerError>;

    /// Promotes a staged keyset to active custody for `subscriber_id` once
    /// the registry has approved the subscription, and best-effort clears
    /// the staged copy. Returns the promoted keyset.
    async fn promote_staged_keyset(&self, message_id: &str, subscriber_id: &str) -> Result<Keyset, KeyManagerError>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event publication failed: {0}")]
    Backend(String),
}

impl ErrorCode for PublishError {
    fn code(&self) -> &'static str {
        "EVENT_PUBLISH_FAILED"
    }
}

/// Fire-and-forget event fan-out (backed by a Pub/Sub topic in production;
/// see `event.{projectID, topicID}` config). Callers never block or fail on
/// a publish error: the registry/subscriber services log it and move on, per
/// §7's propagation policy ("event publish failures are logged but never
/// surfaced").
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `payload` tagged with the stable `event_type` token (e.g.
    /// `NEW_SUBSCRIPTION_REQUEST`, `SUBSCRIPTION_REQUEST_APPROVED`).
    async fn publish(
        &self,
        event_type: &'static str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}

#[derive(Debug, Error)]
pub enum NpClientError {
    #[error("request to network participant failed: {0}")]
    Transport(String),
    #[error("network participant responded with an error status: {0}")]
    RemoteRejected(String),
    #[error("request to network participant timed out")]
    Timeout,
}

impl ErrorCode for NpClientError {
    fn code(&self) -> &'static str {
        match self {
            NpClientError::Transport(_) => "NP_CLIENT_TRANSPORT_ERROR",
            NpClientError::RemoteRejected(_) => "NP_CLIENT_REMOTE_REJECTED",
            NpClientError::Timeout => "NP_CLIENT_TIMEOUT",
        }
    }
}

/// Outbound calls the registry makes directly to a network participant's
/// subscriber endpoint: the `on_subscribe` challenge round, and the proxied
/// Beckn call a task worker relays on behalf of a lookup fan-out.
#[async_trait]
pub trait NpClient: Send + Sync {
    async fn on_subscribe(
        &self,
        url: &str,
        challenge_ciphertext: &str,
        message_id: &str,
    ) -> Result<serde_json::Value, NpClientError>;

    async fn relay(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, NpClientError>;
}

#[derive(Debug, Error)]
pub enum RegistryClientError {
    #[error("request to registry failed: {0}")]
    Transport(String),
    #[error("registry responded with an error: {0}")]
    RemoteRejected(String),
    #[error("operation {0} not found")]
    OperationNotFound(String),
}

impl ErrorCode for RegistryClientError {
    fn code(&self) -> &'static str {
        match self {
            RegistryClientError::Transport(_) => "REGISTRY_CLIENT_TRANSPORT_ERROR",
            RegistryClientError::RemoteRejected(_) => "REGISTRY_CLIENT_REMOTE_REJECTED",
            RegistryClientError::OperationNotFound(_) => "OPERATION_NOT_FOUND",
        }
    }
}

/// The subscriber-side view of the registry: calls a Network Participant's
/// backend makes outward to subscribe itself, renew, resolve peers and poll
/// an in-flight operation's status.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// `POST /subscribe`.
    async fn subscribe(&self, body: serde_json::Value) -> Result<serde_json::Value, RegistryClientError>;

    /// `PATCH /subscribe`, signed with `authorization` (an `AuthGen`-produced
    /// header value) per §4.J's `UpdateSubscription`.
    async fn update_subscription(
        &self,
        body: serde_json::Value,
        authorization: &str,
    ) -> Result<serde_json::Value, RegistryClientError>;

    /// `POST /lookup`.
    async fn lookup(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, RegistryClientError>;

    /// `GET /operations/{operation_id}`.
    async fn get_operation(&self, operation_id: &str) -> Result<Lro, RegistryClientError>;
}
