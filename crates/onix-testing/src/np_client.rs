//! A scripted [`NpClient`] fake: canned `on_subscribe`/`relay` responses
//! keyed by URL, plus a recording of every call made so tests can assert on
//! what the admin engine or lookup processor actually sent.

use async_trait::async_trait;
use dashmap::DashMap;
use onix_api::ports::{NpClient, NpClientError};
use std::sync::Mutex;

#[derive(Clone)]
enum Scripted {
    Value(serde_json::Value),
    Rejected(String),
    Transport(String),
}

#[derive(Default)]
pub struct ScriptedNpClient {
    on_subscribe: DashMap<String, Scripted>,
    relay: DashMap<String, Scripted>,
    on_subscribe_calls: Mutex<Vec<(String, String, String)>>,
    relay_calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ScriptedNpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_subscribe_answer(self, url: impl Into<String>, answer: impl Into<String>) -> Self {
        self.on_subscribe.insert(
            url.into(),
            Scripted::Value(serde_json::json!({ "answer": answer.into() })),
        );
        self
    }

    pub fn with_on_subscribe_rejected(self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.on_subscribe.insert(url.into(), Scripted::Rejected(reason.into()));
        self
    }

    pub fn with_on_subscribe_transport_error(self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.on_subscribe.insert(url.into(), Scripted::Transport(reason.into()));
        self
    }

    pub fn with_relay_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
        self.relay.insert(url.into(), Scripted::Value(response));
        self
    }

    pub fn on_subscribe_calls(&self) -> Vec<(String, String, String)> {
        self.on_subscribe_calls.lock().unwrap().clone()
    }

    pub fn relay_calls(&self) -> Vec<(String, serde_json::Value)> {
        self.relay_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NpClient for ScriptedNpClient {
    async fn on_subscribe(
        &self,
        url: &str,
        challenge_ciphertext: &str,
        message_id: &str,
    ) -> Result<serde_json::Value, NpClientError> {
        self.on_subscribe_calls.lock().unwrap().push((
            url.to_string(),
            challenge_ciphertext.to_string(),
            message_id.to_string(),
        ));

        match self.on_subscribe.get(url).map(|r| r.value().clone()) {
            Some(Scripted::Value(v)) => Ok(v),
            Some(Scripted::Rejected(reason)) => Err(NpClientError::RemoteRejected(reason)),
            Some(Scripted::Transport(reason)) => Err(NpClientError::Transport(reason)),
            None => Err(NpClientError::Transport(format!("no scripted response for {url}"))),
        }
    }

    async fn relay(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, NpClientError> {
        self.relay_calls.lock().unwrap().push((url.to_string(), body));

        match self.relay.get(url).map(|r| r.value().clone()) {
            Some(Scripted::Value(v)) => Ok(v),
            Some(Scripted::Rejected(reason)) => Err(NpClientError::RemoteRejected(reason)),
            Some(Scripted::Transport(reason)) => Err(NpClientError::Transport(reason)),
            None => Err(NpClientError::Transport(format!("no scripted response for {url}"))),
        }
    }
}
