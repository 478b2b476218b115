//! §4.H — the admin LRO engine: the approve/reject state machine and the
//! challenge/response handshake that gates a subscription's admission.
//!
//! The Go source this is adapted from threads the approve workflow through
//! nested helper returns with a side-effecting `updateLROError` call on every
//! failure path (§9's design notes flag this explicitly). Here every failure
//! path funnels through [`AdminEngine::record_failure`], which *is* that
//! helper: it owns the retry-count increment, the forced-REJECTED escalation
//! once `retry_count` exceeds `operation_retry_max`, and the "persist, but
//! always return the original processing error" rule from §7.

use std::sync::Arc;

use onix_api::crypto::Encryptor;
use onix_api::ports::{EventPublisher, NpClient, RegistryRepository};
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Lro, LroStatus, LroType, Subscription, SubscriptionRequest, SubscriptionStatus};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::challenge_source::ChallengeSource;
use crate::error::AdminError;
use crate::events;

const DEFAULT_VALIDITY_DAYS: i64 = 365;

pub struct AdminEngine {
    repository: Arc<dyn RegistryRepository>,
    encryptor: Arc<dyn Encryptor>,
    np_client: Arc<dyn NpClient>,
    events: Arc<dyn EventPublisher>,
    challenge_source: Arc<dyn ChallengeSource>,
    operation_retry_max: u32,
}

fn resolve_validity(request: &SubscriptionRequest, now: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
    use time::format_description::well_known::Rfc3339;

    let valid_from = request
        .valid_from
        .as_deref()
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        .unwrap_or(now);
    let mut valid_until = request
        .valid_until
        .as_deref()
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        .unwrap_or(now + time::Duration::days(DEFAULT_VALIDITY_DAYS));
    if valid_until <= valid_from {
        valid_until = valid_from + time::Duration::days(DEFAULT_VALIDITY_DAYS);
    }
    (valid_from, valid_until)
}

impl AdminEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn RegistryRepository>,
        encryptor: Arc<dyn Encryptor>,
        np_client: Arc<dyn NpClient>,
        events: Arc<dyn EventPublisher>,
        challenge_source: Arc<dyn ChallengeSource>,
        operation_retry_max: u32,
    ) -> Self {
        Self {
            repository,
            encryptor,
            np_client,
            events,
            challenge_source,
            operation_retry_max,
        }
    }

    /// Loads the LRO and checks the three preconditions shared by
    /// `ApproveSubscription` and `RejectSubscription` (§4.H.1).
    async fn load_actionable(&self, operation_id: &str) -> Result<Lro, AdminError> {
        let lro = self
            .repository
            .get_lro(operation_id)
            .await
            .map_err(|_| AdminError::NotFound(operation_id.to_string()))?;

        if lro.retry_count > self.operation_retry_max {
            return Err(AdminError::MaxRetriesExceeded(operation_id.to_string()));
        }
        if lro.status.is_terminal() {
            return Err(AdminError::AlreadyProcessed(operation_id.to_string()));
        }
        Ok(lro)
    }

    /// The `updateLROError` helper: marks `lro` with `reason` and bumps
    /// `retry_count`, forcing REJECTED if the new count exceeds the max
    /// regardless of the caller-requested `status`. Persists the result and
    /// always returns an [`AdminError`] wrapping the *original* `reason` —
    /// a failure to persist this update is logged but never takes its
    /// place, matching §7's propagation policy.
    async fn record_failure(&self, mut lro: Lro, reason: String, status: LroStatus) -> AdminError {
        let operation_id = lro.operation_id.clone();
        lro.error_data_json = serde_json::to_vec(&serde_json::json!({ "error": reason })).ok();
        lro.retry_count += 1;
        lro.status = if lro.retry_count > self.operation_retry_max {
            LroStatus::Rejected
        } else {
            status
        };
        lro.updated_at = OffsetDateTime::now_utc();

        if let Err(e) = self.repository.update_lro(lro).await {
            tracing::error!(
                target: "onix-registry-core",
                operation_id = %operation_id,
                error = %e,
                "failed to persist LRO failure state; original processing error still returned"
            );
        }
        AdminError::ProcessingFailed(reason)
    }

    /// Runs the full §4.H.1–8 approve workflow.
    pub async fn approve_subscription(&self, operation_id: &str) -> Result<Lro, AdminError> {
        let lro = self.load_actionable(operation_id).await?;

        let request: SubscriptionRequest = match serde_json::from_slice(&lro.request_json) {
            Ok(r) => r,
            Err(e) => {
                return Err(self
                    .record_failure(lro, format!("invalid request payload: {e}"), LroStatus::Rejected)
                    .await)
            }
        };
        if request.url.is_empty() || request.encr_public_key.is_empty() {
            return Err(self
                .record_failure(lro, "request missing url or encr_public_key".to_string(), LroStatus::Rejected)
                .await);
        }

        let filter = SubscriptionFilter {
            subscriber_id: Some(request.subscriber_id.clone()),
            domain: Some(request.domain.clone()),
            role: Some(request.role),
            location: None,
        };
        let existing = match self.repository.lookup_subscriptions(&filter).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.record_failure(lro, e.to_string(), LroStatus::Failure).await),
        };

        match lro.lro_type {
            LroType::CreateSubscription if !existing.is_empty() => {
                return Err(self
                    .record_failure(lro, "subscription already exists".to_string(), LroStatus::Failure)
                    .await)
            }
            LroType::UpdateSubscription if existing.is_empty() => {
                return Err(self
                    .record_failure(lro, "no existing subscription to update".to_string(), LroStatus::Failure)
                    .await)
            }
            _ => {}
        }

        let challenge = self.challenge_source.generate();
        let ciphertext = match self
            .encryptor
            .encrypt(&request.encr_public_key, challenge.as_str().as_bytes())
            .await
        {
            Ok(c) => c,
            Err(e) => return Err(self.record_failure(lro, e.to_string(), LroStatus::Failure).await),
        };

        let response = match self.np_client.on_subscribe(&request.url, &ciphertext, &request.message_id).await {
            Ok(r) => r,
            Err(e) => return Err(self.record_failure(lro, e.to_string(), LroStatus::Failure).await),
        };
        let answer = match response.get("answer").and_then(|v| v.as_str()) {
            Some(a) => a.to_string(),
            None => {
                return Err(self
                    .record_failure(lro, "on_subscribe response missing answer".to_string(), LroStatus::Failure)
                    .await)
            }
        };

        if !challenge.verify(&answer) {
            return Err(self
                .record_failure(lro, "challenge verification failed".to_string(), LroStatus::Failure)
                .await);
        }

        let now = OffsetDateTime::now_utc();
        let (valid_from, valid_until) = resolve_validity(&request, now);
        let subscription = Subscription::new(
            request.subscriber_id.clone(),
            request.domain.clone(),
            request.role,
            request.unique_key_id.clone(),
            request.signing_public_key.clone(),
            request.encr_public_key.clone(),
            request.url.clone(),
            request.location.clone(),
            valid_from,
            valid_until,
            SubscriptionStatus::Subscribed,
            Uuid::new_v4().to_string(),
            now,
        )
        .map_err(|e| AdminError::Internal(e.to_string()))?;

        let mut approved_lro = lro;
        approved_lro.status = LroStatus::Approved;
        approved_lro.result_json =
            serde_json::to_vec(&serde_json::json!({ "subscriber_id": request.subscriber_id })).ok();
        approved_lro.updated_at = now;

        self.repository
            .upsert_subscription_and_lro(subscription, approved_lro.clone())
            .await
            .map_err(|e| AdminError::Internal(format!("atomic upsert failed: {e}")))?;

        if let Err(e) = self
            .events
            .publish(
                events::SUBSCRIPTION_REQUEST_APPROVED,
                serde_json::json!({ "operation_id": approved_lro.operation_id }),
            )
            .await
        {
            tracing::warn!(
                target: "onix-registry-core",
                operation_id = %approved_lro.operation_id,
                error = %e,
                "event publish failed, continuing"
            );
        }

        Ok(approved_lro)
    }

    /// Runs the §4.H `RejectSubscription` workflow.
    pub async fn reject_subscription(&self, operation_id: &str, reason: Option<String>) -> Result<Lro, AdminError> {
        let reason = reason.filter(|r| !r.is_empty()).ok_or(AdminError::MissingReason)?;
        let mut lro = self.load_actionable(operation_id).await?;

        lro.error_data_json = serde_json::to_vec(&serde_json::json!({ "reason": reason })).ok();
        lro.status = LroStatus::Rejected;
        lro.updated_at = OffsetDateTime::now_utc();

        self.repository
            .update_lro(lro.clone())
            .await
            .map_err(|e| AdminError::Internal(e.to_string()))?;

        if let Err(e) = self
            .events
            .publish(
                events::SUBSCRIPTION_REQUEST_REJECTED,
                serde_json::json!({ "operation_id": lro.operation_id, "reason": reason }),
            )
            .await
        {
            tracing::warn!(
                target: "onix-registry-core",
                operation_id = %lro.operation_id,
                error = %e,
                "event publish failed, continuing"
            );
        }

        Ok(lro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onix_testing::{FakeEncryptor, InMemoryRegistryRepository, RecordingEventPublisher, ScriptedNpClient};
    use onix_types::subscriber::Role;

    struct FixedChallengeSource(onix_crypto::Challenge);
    impl ChallengeSource for FixedChallengeSource {
        fn generate(&self) -> onix_crypto::Challenge {
            self.0.clone()
        }
    }

    fn seeded_lro(lro_type: LroType, retry_count: u32) -> Lro {
        let req = serde_json::json!({
            "message_id": "op1",
            "subscriber_id": "bap1",
            "domain": "retail",
            "role": "BAP",
            "url": "http://bap1/cb",
            "unique_key_id": "k1",
            "signing_public_key": "pub",
            "encr_public_key": "epub",
        });
        let mut lro = Lro::new("op1", lro_type, serde_json::to_vec(&req).unwrap(), OffsetDateTime::now_utc());
        lro.retry_count = retry_count;
        lro
    }

    fn harness(
        lro: Lro,
        np_client: ScriptedNpClient,
    ) -> (AdminEngine, Arc<InMemoryRegistryRepository>, Arc<RecordingEventPublisher>) {
        let repository = Arc::new(InMemoryRegistryRepository::new());
        repository.seed_lro(lro);
        let events = Arc::new(RecordingEventPublisher::new());
        let engine = AdminEngine::new(
            repository.clone(),
            Arc::new(FakeEncryptor),
            Arc::new(np_client),
            events.clone(),
            Arc::new(FixedChallengeSource(onix_crypto::Challenge::generate())),
            3,
        );
        (engine, repository, events)
    }

    #[tokio::test]
    async fn s1_happy_path_approve_create() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let engine_challenge = onix_crypto::Challenge::generate();
        let np_client =
            ScriptedNpClient::new().with_on_subscribe_answer("http://bap1/cb", engine_challenge.as_str());
        let repository = Arc::new(InMemoryRegistryRepository::new());
        repository.seed_lro(lro);
        let events = Arc::new(RecordingEventPublisher::new());
        let engine = AdminEngine::new(
            repository.clone(),
            Arc::new(FakeEncryptor),
            Arc::new(np_client),
            events.clone(),
            Arc::new(FixedChallengeSource(engine_challenge)),
            3,
        );

        let approved = engine.approve_subscription("op1").await.unwrap();
        assert!(matches!(approved.status, LroStatus::Approved));
        assert_eq!(events.count(events::SUBSCRIPTION_REQUEST_APPROVED), 1);
        assert_eq!(repository.subscription_count(), 1);
    }

    #[tokio::test]
    async fn approve_sends_message_id_alongside_the_encrypted_challenge() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let engine_challenge = onix_crypto::Challenge::generate();
        let np_client =
            ScriptedNpClient::new().with_on_subscribe_answer("http://bap1/cb", engine_challenge.as_str());
        let repository = Arc::new(InMemoryRegistryRepository::new());
        repository.seed_lro(lro);
        let events = Arc::new(RecordingEventPublisher::new());
        let np_client = Arc::new(np_client);
        let engine = AdminEngine::new(
            repository,
            Arc::new(FakeEncryptor),
            np_client.clone(),
            events,
            Arc::new(FixedChallengeSource(engine_challenge)),
            3,
        );

        engine.approve_subscription("op1").await.unwrap();

        let calls = np_client.on_subscribe_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, "op1", "on_subscribe must carry the request's message_id");
    }

    #[tokio::test]
    async fn s2_challenge_mismatch_fails_and_does_not_subscribe() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let np_client = ScriptedNpClient::new().with_on_subscribe_answer("http://bap1/cb", "wrong-answer");
        let (engine, repository, _events) = harness(lro, np_client);

        let err = engine.approve_subscription("op1").await.unwrap_err();
        assert!(matches!(err, AdminError::ProcessingFailed(msg) if msg.contains("challenge verification failed")));

        let stored = repository.get_lro("op1").await.unwrap();
        assert!(matches!(stored.status, LroStatus::Failure));
        assert_eq!(stored.retry_count, 1);
        assert_eq!(repository.subscription_count(), 0);
    }

    #[tokio::test]
    async fn retry_count_exceeding_max_forces_rejected() {
        let lro = seeded_lro(LroType::CreateSubscription, 3);
        let np_client = ScriptedNpClient::new().with_on_subscribe_answer("http://bap1/cb", "wrong-answer");
        let (engine, repository, _events) = harness(lro, np_client);

        engine.approve_subscription("op1").await.unwrap_err();
        let stored = repository.get_lro("op1").await.unwrap();
        assert!(matches!(stored.status, LroStatus::Rejected));
        assert_eq!(stored.retry_count, 4);
    }

    #[tokio::test]
    async fn already_terminal_lro_cannot_be_reprocessed() {
        let mut lro = seeded_lro(LroType::CreateSubscription, 0);
        lro.status = LroStatus::Approved;
        let np_client = ScriptedNpClient::new();
        let (engine, _repository, _events) = harness(lro, np_client);

        let err = engine.approve_subscription("op1").await.unwrap_err();
        assert!(matches!(err, AdminError::AlreadyProcessed(_)));
    }

    #[tokio::test]
    async fn s3_reject_without_reason_is_rejected_with_validation_error() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let np_client = ScriptedNpClient::new();
        let (engine, repository, _events) = harness(lro, np_client);

        let err = engine.reject_subscription("op1", None).await.unwrap_err();
        assert!(matches!(err, AdminError::MissingReason));
        assert_eq!(err.status(), 400);

        let stored = repository.get_lro("op1").await.unwrap();
        assert!(matches!(stored.status, LroStatus::Pending));
    }

    #[tokio::test]
    async fn reject_with_reason_is_terminal() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let np_client = ScriptedNpClient::new();
        let (engine, repository, events) = harness(lro, np_client);

        let rejected = engine.reject_subscription("op1", Some("not eligible".into())).await.unwrap();
        assert!(matches!(rejected.status, LroStatus::Rejected));
        assert_eq!(events.count(events::SUBSCRIPTION_REQUEST_REJECTED), 1);

        let err = engine.reject_subscription("op1", Some("again".into())).await.unwrap_err();
        assert!(matches!(err, AdminError::AlreadyProcessed(_)));
        let _ = repository;
    }

    #[tokio::test]
    async fn create_conflict_records_failure_not_rejected() {
        let lro = seeded_lro(LroType::CreateSubscription, 0);
        let np_client = ScriptedNpClient::new();
        let (engine, repository, _events) = harness(lro, np_client);

        repository.seed_subscription(
            Subscription::new(
                "bap1",
                "retail",
                Role::Bap,
                "k0",
                "pub",
                "epub",
                "http://bap1/cb",
                None,
                OffsetDateTime::now_utc(),
                OffsetDateTime::now_utc() + time::Duration::days(1),
                SubscriptionStatus::Subscribed,
                "nonce",
                OffsetDateTime::now_utc(),
            )
            .unwrap(),
        );

        let err = engine.approve_subscription("op1").await.unwrap_err();
        assert!(matches!(err, AdminError::ProcessingFailed(msg) if msg.contains("already exists")));
        let stored = repository.get_lro("op1").await.unwrap();
        assert!(matches!(stored.status, LroStatus::Failure));
    }
}
