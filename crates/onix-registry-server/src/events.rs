//! A structured-log-only [`EventPublisher`]. Pub/Sub delivery is a Non-goal
//! (`event.{projectID, topicID}` is accepted but not wired to a broker); this
//! still gives operators a durable audit trail via the ordinary log spine.

use async_trait::async_trait;
use onix_api::ports::{EventPublisher, PublishError};

#[derive(Debug, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event_type: &'static str, payload: serde_json::Value) -> Result<(), PublishError> {
        tracing::info!(target: "onix-registry-server", event_type, %payload, "event published");
        Ok(())
    }
}
