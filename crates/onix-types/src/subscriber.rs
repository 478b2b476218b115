//! The subscriber identity: the tuple every Subscription, LRO request and
//! Keyset is anchored on.

use serde::{Deserialize, Serialize};

/// Role a Network Participant plays in a given domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "BAP")]
    Bap,
    #[serde(rename = "BPP")]
    Bpp,
    #[serde(rename = "BG")]
    Bg,
    #[serde(rename = "REGISTRY")]
    Registry,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Bap => "BAP",
            Role::Bpp => "BPP",
            Role::Bg => "BG",
            Role::Registry => "REGISTRY",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity key for a Subscriber: `(subscriber_id, domain, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscriber {
    pub subscriber_id: String,
    pub domain: String,
    pub role: Role,
    pub url: String,
    /// Free-form location (e.g. a country/city code); the spec leaves the
    /// shape unconstrained.
    #[serde(default)]
    pub location: Option<String>,
}

/// The `(subscriber_id, domain, role)` identity key, used as a lookup filter
/// throughout the repository and registry-client interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberKey {
    pub subscriber_id: String,
    pub domain: String,
    pub role: Role,
}
