//! The wire body submitted to `POST`/`PATCH /subscribe`: what a candidate
//! subscriber proposes, before the registry has assigned it a status.

use serde::{Deserialize, Serialize};

use crate::subscriber::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub message_id: String,
    pub subscriber_id: String,
    pub domain: String,
    pub role: Role,
    pub url: String,
    #[serde(default)]
    pub unique_key_id: String,
    #[serde(default)]
    pub signing_public_key: String,
    #[serde(default)]
    pub encr_public_key: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
}
