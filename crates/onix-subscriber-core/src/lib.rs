//! NP-side subscriber service: subscription intake/update, LRO status
//! polling with keyset promotion, and the `on_subscribe` challenge
//! responder (§4.J).

pub mod error;
pub mod service;

pub use error::SubscriberError;
pub use service::{OnSubscribeRequest, OnSubscribeResponse, SubscriberService, ON_SUBSCRIBE_RECEIVED};
