//! The `POST /operations/action` admin request body (§6): approve or reject
//! an in-flight Long-Running Operation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminActionKind {
    ApproveSubscription,
    RejectSubscription,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminActionRequest {
    pub operation_id: String,
    pub action: AdminActionKind,
    #[serde(default)]
    pub reason: Option<String>,
}
