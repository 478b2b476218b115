//! An [`EventPublisher`] fake that records every publish call for
//! assertions, and can be told to fail so callers' "log but never surface"
//! handling (§7) is exercised.

use async_trait::async_trait;
use onix_api::ports::{EventPublisher, PublishError};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: make every subsequent `publish` call return an error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<(&'static str, serde_json::Value)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|(ty, _)| *ty == event_type)
            .count()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event_type: &'static str, payload: serde_json::Value) -> Result<(), PublishError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PublishError::Backend("publisher configured to fail".into()));
        }
        self.events.lock().unwrap().push((event_type, payload));
        Ok(())
    }
}
