//! §4.G — turns an inbound subscription request into a `PENDING` LRO and
//! fans out a `NEW_SUBSCRIPTION_REQUEST`/`UPDATE_SUBSCRIPTION_REQUEST` event.
//! The service never mutates an LRO past creation; approval/rejection is the
//! admin engine's job (§4.H).

use std::sync::Arc;

use onix_api::ports::{EventPublisher, RegistryRepository};
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Lro, LroType, Subscription, SubscriptionRequest};
use time::OffsetDateTime;

use crate::error::SubscriptionError;
use crate::events;
use crate::lro_service::LroService;

pub struct SubscriptionService {
    lro_service: LroService,
    repository: Arc<dyn RegistryRepository>,
    events: Arc<dyn EventPublisher>,
}

impl SubscriptionService {
    pub fn new(repository: Arc<dyn RegistryRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            lro_service: LroService::new(repository.clone()),
            repository,
            events,
        }
    }

    pub async fn create(&self, req: Option<SubscriptionRequest>) -> Result<Lro, SubscriptionError> {
        self.submit(req, LroType::CreateSubscription, events::NEW_SUBSCRIPTION_REQUEST)
            .await
    }

    pub async fn update(&self, req: Option<SubscriptionRequest>) -> Result<Lro, SubscriptionError> {
        self.submit(req, LroType::UpdateSubscription, events::UPDATE_SUBSCRIPTION_REQUEST)
            .await
    }

    async fn submit(
        &self,
        req: Option<SubscriptionRequest>,
        lro_type: LroType,
        event_type: &'static str,
    ) -> Result<Lro, SubscriptionError> {
        let req = req.ok_or(SubscriptionError::EmptyRequest)?;
        let request_json = serde_json::to_vec(&req).map_err(|_| SubscriptionError::EmptyRequest)?;

        let lro = Lro::new(req.message_id.clone(), lro_type, request_json, OffsetDateTime::now_utc());
        self.lro_service.create(lro.clone()).await.map_err(|e| match e {
            crate::error::LroError::AlreadyExists(id) => SubscriptionError::Duplicate(id),
            other => SubscriptionError::Lro(other),
        })?;

        if let Err(e) = self.events.publish(event_type, serde_json::json!(req)).await {
            tracing::warn!(
                target: "onix-registry-core",
                operation_id = %lro.operation_id,
                error = %e,
                "event publish failed, continuing"
            );
        }

        Ok(lro)
    }

    pub async fn lookup(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, SubscriptionError> {
        Ok(self
            .repository
            .lookup_subscriptions(filter)
            .await
            .map_err(crate::error::LroError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onix_testing::{InMemoryRegistryRepository, RecordingEventPublisher};
    use onix_types::subscriber::Role;

    fn req(message_id: &str) -> SubscriptionRequest {
        SubscriptionRequest {
            message_id: message_id.to_string(),
            subscriber_id: "bap1".to_string(),
            domain: "retail".to_string(),
            role: Role::Bap,
            url: "http://bap1/cb".to_string(),
            unique_key_id: "k1".to_string(),
            signing_public_key: "pub".to_string(),
            encr_public_key: "epub".to_string(),
            location: None,
            valid_from: None,
            valid_until: None,
        }
    }

    fn service() -> (SubscriptionService, Arc<RecordingEventPublisher>) {
        let events = Arc::new(RecordingEventPublisher::new());
        let service = SubscriptionService::new(Arc::new(InMemoryRegistryRepository::new()), events.clone());
        (service, events)
    }

    #[tokio::test]
    async fn create_seeds_a_pending_lro_and_publishes() {
        let (service, events) = service();
        let lro = service.create(Some(req("op1"))).await.unwrap();
        assert_eq!(lro.operation_id, "op1");
        assert!(matches!(lro.status, onix_types::LroStatus::Pending));
        assert_eq!(events.count(crate::events::NEW_SUBSCRIPTION_REQUEST), 1);
    }

    #[tokio::test]
    async fn update_publishes_update_event() {
        let (service, events) = service();
        service.update(Some(req("op2"))).await.unwrap();
        assert_eq!(events.count(crate::events::UPDATE_SUBSCRIPTION_REQUEST), 1);
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let (service, _events) = service();
        let err = service.create(None).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::EmptyRequest));
    }

    #[tokio::test]
    async fn duplicate_message_id_surfaces_as_conflict() {
        use onix_types::error::ErrorCode;

        let (service, _events) = service();
        service.create(Some(req("dup"))).await.unwrap();
        let err = service.create(Some(req("dup"))).await.unwrap_err();
        assert_eq!(err.status(), 409);
        assert_eq!(err.code(), "DUPLICATE_REQUEST");
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_the_request() {
        let events = Arc::new(RecordingEventPublisher::new());
        events.set_failing(true);
        let service = SubscriptionService::new(Arc::new(InMemoryRegistryRepository::new()), events);
        service.create(Some(req("op3"))).await.unwrap();
    }
}
