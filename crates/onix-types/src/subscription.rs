//! A Subscriber plus key material and lifecycle status.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::subscriber::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    #[serde(rename = "INITIATED")]
    Initiated,
    #[serde(rename = "UNDER_SUBSCRIPTION")]
    UnderSubscription,
    #[serde(rename = "SUBSCRIBED")]
    Subscribed,
    #[serde(rename = "INVALID_SSL")]
    InvalidSsl,
    #[serde(rename = "UNSUBSCRIBED")]
    Unsubscribed,
}

/// PK `(subscriber_id, domain, role, key_id)`. Invariant: at most one
/// SUBSCRIBED row per PK; `valid_until > valid_from` is enforced by
/// [`Subscription::new`] and by repository implementations on write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub subscriber_id: String,
    pub domain: String,
    pub role: Role,
    pub key_id: String,
    pub signing_public_key: String,
    pub encr_public_key: String,
    pub url: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_until: OffsetDateTime,
    pub status: SubscriptionStatus,
    pub nonce: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Error raised by [`Subscription::new`] when `valid_until <= valid_from`.
#[derive(Debug, thiserror::Error)]
#[error("valid_until ({valid_until}) must be strictly after valid_from ({valid_from})")]
pub struct InvalidValidityWindow {
    pub valid_from: OffsetDateTime,
    pub valid_until: OffsetDateTime,
}

impl Subscription {
    /// Constructs a Subscription, enforcing the `valid_until > valid_from`
    /// invariant at the boundary rather than trusting callers.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subscriber_id: impl Into<String>,
        domain: impl Into<String>,
        role: Role,
        key_id: impl Into<String>,
        signing_public_key: impl Into<String>,
        encr_public_key: impl Into<String>,
        url: impl Into<String>,
        location: Option<String>,
        valid_from: OffsetDateTime,
        valid_until: OffsetDateTime,
        status: SubscriptionStatus,
        nonce: impl Into<String>,
        now: OffsetDateTime,
    ) -> Result<Self, InvalidValidityWindow> {
        if valid_until <= valid_from {
            return Err(InvalidValidityWindow {
                valid_from,
                valid_until,
            });
        }
        Ok(Self {
            subscriber_id: subscriber_id.into(),
            domain: domain.into(),
            role,
            key_id: key_id.into(),
            signing_public_key: signing_public_key.into(),
            encr_public_key: encr_public_key.into(),
            url: url.into(),
            location,
            valid_from,
            valid_until,
            status,
            nonce: nonce.into(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn identity_key(&self) -> (&str, &str, Role, &str) {
        (&self.subscriber_id, &self.domain, self.role, &self.key_id)
    }
}

/// Filter used by `RegistryRepository::lookup_subscriptions` and by the
/// `POST /lookup` wire request. Any field left `None` matches broadly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    #[serde(default)]
    pub subscriber_id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub location: Option<String>,
}
