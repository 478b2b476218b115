//! Async fan-out tasks: the unit of work the task queue dispatches to
//! workers, and the Beckn message envelope a lookup/proxy task carries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "LOOKUP")]
    Lookup,
    #[serde(rename = "PROXY")]
    Proxy,
}

/// The Beckn `context` block carried on a lookup/proxy request: enough to
/// route and correlate the call, opaque otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BecknContext {
    pub domain: String,
    pub action: String,
    pub message_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub bap_id: String,
    pub bap_uri: String,
    #[serde(default)]
    pub bpp_id: Option<String>,
    #[serde(default)]
    pub bpp_uri: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// A unit of work handed to a worker by the task queue. `target_url` and
/// `payload` are populated differently for `LOOKUP` (no target yet, the
/// lookup processor resolves the fan-out set) versus `PROXY` (target is a
/// single resolved subscriber endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncTask {
    pub task_id: String,
    pub task_type: TaskType,
    pub context: BecknContext,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub target_url: Option<String>,
    /// The request headers a proxy task relays on, a clone of the
    /// originating request's headers plus any the lookup processor adds
    /// (e.g. a generated `X-Gateway-Authorization`).
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl AsyncTask {
    pub fn lookup(
        task_id: impl Into<String>,
        context: BecknContext,
        payload: serde_json::Value,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: TaskType::Lookup,
            context,
            payload,
            target_url: None,
            headers,
        }
    }

    pub fn proxy(
        task_id: impl Into<String>,
        context: BecknContext,
        payload: serde_json::Value,
        target_url: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: TaskType::Proxy,
            context,
            payload,
            target_url: Some(target_url.into()),
            headers,
        }
    }
}
