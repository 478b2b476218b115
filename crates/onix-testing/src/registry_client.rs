//! A scripted [`RegistryClient`] fake used by subscriber-side (`onix-subscriber-core`)
//! tests: canned lookup/subscribe/operation results, no network involved.

use async_trait::async_trait;
use dashmap::DashMap;
use onix_api::ports::{RegistryClient, RegistryClientError};
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Lro, Subscription};
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedRegistryClient {
    subscribe_response: Mutex<Option<serde_json::Value>>,
    update_response: Mutex<Option<serde_json::Value>>,
    lookup_results: Mutex<Vec<Subscription>>,
    operations: DashMap<String, Lro>,
    subscribe_calls: Mutex<Vec<serde_json::Value>>,
    update_calls: Mutex<Vec<(serde_json::Value, String)>>,
}

impl ScriptedRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribe_response(self, response: serde_json::Value) -> Self {
        *self.subscribe_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_update_response(self, response: serde_json::Value) -> Self {
        *self.update_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_lookup_results(self, results: Vec<Subscription>) -> Self {
        *self.lookup_results.lock().unwrap() = results;
        self
    }

    pub fn with_operation(self, lro: Lro) -> Self {
        self.operations.insert(lro.operation_id.clone(), lro);
        self
    }

    pub fn subscribe_calls(&self) -> Vec<serde_json::Value> {
        self.subscribe_calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<(serde_json::Value, String)> {
        self.update_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryClient for ScriptedRegistryClient {
    async fn subscribe(&self, body: serde_json::Value) -> Result<serde_json::Value, RegistryClientError> {
        self.subscribe_calls.lock().unwrap().push(body);
        self.subscribe_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RegistryClientError::Transport("no scripted subscribe response".into()))
    }

    async fn update_subscription(
        &self,
        body: serde_json::Value,
        authorization: &str,
    ) -> Result<serde_json::Value, RegistryClientError> {
        self.update_calls
            .lock()
            .unwrap()
            .push((body, authorization.to_string()));
        self.update_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RegistryClientError::Transport("no scripted update response".into()))
    }

    async fn lookup(&self, _filter: &SubscriptionFilter) -> Result<Vec<Subscription>, RegistryClientError> {
        Ok(self.lookup_results.lock().unwrap().clone())
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Lro, RegistryClientError> {
        self.operations
            .get(operation_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RegistryClientError::OperationNotFound(operation_id.to_string()))
    }
}
