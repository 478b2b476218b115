//! Stable event-type tokens published by the registry-side services, fanned
//! out through [`onix_api::ports::EventPublisher`] (a Pub/Sub topic in
//! production; see `event.{projectID, topicID}` config).

pub const NEW_SUBSCRIPTION_REQUEST: &str = "NEW_SUBSCRIPTION_REQUEST";
pub const UPDATE_SUBSCRIPTION_REQUEST: &str = "UPDATE_SUBSCRIPTION_REQUEST";
pub const SUBSCRIPTION_REQUEST_APPROVED: &str = "SUBSCRIPTION_REQUEST_APPROVED";
pub const SUBSCRIPTION_REQUEST_REJECTED: &str = "SUBSCRIPTION_REQUEST_REJECTED";
