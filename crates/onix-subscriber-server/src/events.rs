//! A structured-log-only [`EventPublisher`], matching
//! `onix-registry-server`'s `LoggingEventPublisher`.

use async_trait::async_trait;
use onix_api::ports::{EventPublisher, PublishError};

#[derive(Debug, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event_type: &'static str, payload: serde_json::Value) -> Result<(), PublishError> {
        tracing::info!(target: "onix-subscriber-server", event_type, %payload, "event published");
        Ok(())
    }
}
