//! §4.J — the subscriber (NP) side of a subscription's lifecycle: intake,
//! update, LRO polling with keyset promotion, and the `on_subscribe`
//! challenge responder.

use std::sync::Arc;

use onix_api::crypto::Decrypter;
use onix_api::ports::{EventPublisher, KeyManager, RegistryClient};
use onix_auth::AuthGen;
use onix_types::{Lro, Keyset, SubscriptionRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{log_publish_failure, SubscriberError};

pub const ON_SUBSCRIBE_RECEIVED: &str = "ON_SUBSCRIBE_RECEIVED";

#[derive(Debug, Clone, Deserialize)]
pub struct OnSubscribeRequest {
    pub message_id: String,
    pub challenge: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnSubscribeResponse {
    pub answer: String,
}

pub struct SubscriberService {
    keys: Arc<dyn KeyManager>,
    registry_client: Arc<dyn RegistryClient>,
    decrypter: Arc<dyn Decrypter>,
    events: Arc<dyn EventPublisher>,
    auth_gen: AuthGen,
    registry_subscriber_id: String,
    registry_key_id: String,
}

impl SubscriberService {
    pub fn new(
        keys: Arc<dyn KeyManager>,
        registry_client: Arc<dyn RegistryClient>,
        decrypter: Arc<dyn Decrypter>,
        signer: Arc<dyn onix_api::crypto::Signer>,
        events: Arc<dyn EventPublisher>,
        registry_subscriber_id: impl Into<String>,
        registry_key_id: impl Into<String>,
    ) -> Self {
        Self {
            auth_gen: AuthGen::new(keys.clone(), signer),
            keys,
            registry_client,
            decrypter,
            events,
            registry_subscriber_id: registry_subscriber_id.into(),
            registry_key_id: registry_key_id.into(),
        }
    }

    fn validate(req: &SubscriptionRequest) -> Result<(), SubscriberError> {
        if req.subscriber_id.is_empty() {
            return Err(SubscriberError::InvalidRequest("subscriber_id must not be empty".into()));
        }
        if req.domain.is_empty() {
            return Err(SubscriberError::InvalidRequest("domain must not be empty".into()));
        }
        Ok(())
    }

    /// Resolves or generates a local keyset for `subscriber_id`, staged
    /// under `message_id` so `on_subscribe` can retrieve it before the
    /// subscription is approved and its keyset promoted to active.
    async fn stage_request_keyset(&self, message_id: &str, subscriber_id: &str) -> Result<Keyset, SubscriberError> {
        let keyset = match self.keys.get_active_keyset(subscriber_id).await {
            Ok(keyset) => keyset,
            Err(_) => self.keys.generate_keyset(subscriber_id).await?,
        };
        self.keys.stage_keyset(message_id, keyset.clone()).await?;
        Ok(keyset)
    }

    /// `CreateSubscription`: `POST /subscribe`.
    pub async fn create_subscription(&self, mut req: SubscriptionRequest) -> Result<String, SubscriberError> {
        Self::validate(&req)?;
        if req.message_id.is_empty() {
            req.message_id = Uuid::new_v4().to_string();
        }

        let keyset = self.stage_request_keyset(&req.message_id, &req.subscriber_id).await?;
        req.unique_key_id = keyset.unique_key_id.clone();
        req.signing_public_key = keyset.signing_public.clone();
        req.encr_public_key = keyset.encr_public.clone();

        self.registry_client.subscribe(serde_json::json!(req)).await?;
        Ok(req.message_id)
    }

    /// `UpdateSubscription`: `PATCH /subscribe`, signed on behalf of the
    /// requesting NP's own `subscriber_id`.
    pub async fn update_subscription(&self, mut req: SubscriptionRequest) -> Result<String, SubscriberError> {
        Self::validate(&req)?;
        if req.message_id.is_empty() {
            req.message_id = Uuid::new_v4().to_string();
        }

        let keyset = self.stage_request_keyset(&req.message_id, &req.subscriber_id).await?;
        req.unique_key_id = keyset.unique_key_id.clone();
        req.signing_public_key = keyset.signing_public.clone();
        req.encr_public_key = keyset.encr_public.clone();

        let body = serde_json::json!(req);
        let body_bytes = serde_json::to_vec(&body).map_err(|e| SubscriberError::InvalidRequest(e.to_string()))?;
        let authorization = self.auth_gen.auth_header(&body_bytes, &req.subscriber_id).await?;

        self.registry_client.update_subscription(body, &authorization).await?;
        Ok(req.message_id)
    }

    /// `UpdateStatus`: polls the registry for `operation_id`'s LRO and, once
    /// `APPROVED`, promotes the staged keyset to active custody.
    pub async fn update_status(&self, operation_id: &str) -> Result<Lro, SubscriberError> {
        let lro = self.registry_client.get_operation(operation_id).await?;

        if matches!(lro.status, onix_types::LroStatus::Approved) {
            let subscriber_id = serde_json::from_slice::<serde_json::Value>(&lro.request_json)
                .ok()
                .and_then(|v| v.get("subscriber_id").and_then(|s| s.as_str()).map(str::to_string));

            let promotion = match subscriber_id {
                Some(subscriber_id) => self.keys.promote_staged_keyset(operation_id, &subscriber_id).await,
                None => Err(onix_api::ports::KeyManagerError::Backend(
                    "LRO request payload carries no subscriber_id".into(),
                )),
            };

            match promotion {
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        target: "onix-subscriber-core",
                        operation_id,
                        error = %e,
                        "failed to promote staged keyset, continuing"
                    );
                }
            }
        }

        Ok(lro)
    }

    /// `OnSubscribe`: answers the registry's challenge, proving custody of
    /// the encryption private key staged for `message_id`.
    pub async fn on_subscribe(&self, req: OnSubscribeRequest) -> Result<OnSubscribeResponse, SubscriberError> {
        if req.message_id.is_empty() || req.challenge.is_empty() {
            return Err(SubscriberError::InvalidRequest(
                "message_id and challenge must not be empty".into(),
            ));
        }

        let keyset = self.keys.get_staged_keyset(&req.message_id).await?;
        if keyset.encr_private.is_empty() {
            return Err(SubscriberError::InvalidRequest(
                "no encryption private key staged for this message_id".into(),
            ));
        }

        // Resolves the Registry's own public key purely for interface
        // fidelity with the handshake as specified; the sealed-box scheme
        // this workspace uses is anonymous (ephemeral per-message keys), so
        // the returned public half is not consulted by the decrypter and a
        // failed lookup here does not block answering the challenge.
        if let Err(e) = self
            .keys
            .lookup_np_keys(&self.registry_subscriber_id, &self.registry_key_id)
            .await
        {
            tracing::debug!(
                target: "onix-subscriber-core",
                error = %e,
                "registry key lookup failed, continuing with local decryption"
            );
        }

        let plaintext = self.decrypter.decrypt(&keyset.unique_key_id, &req.challenge).await?;
        let answer = String::from_utf8(plaintext).map_err(|e| SubscriberError::InvalidRequest(e.to_string()))?;

        if let Err(e) = self
            .events
            .publish(ON_SUBSCRIBE_RECEIVED, serde_json::json!({ "message_id": req.message_id }))
            .await
        {
            log_publish_failure("on_subscribe", e);
        }

        Ok(OnSubscribeResponse { answer })
    }
}
