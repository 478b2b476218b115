//! Core data model for the ONIX registry control plane.
//!
//! This crate has no behavior of its own: it is the set of wire/persisted
//! shapes (`Subscriber`, `Subscription`, `Lro`, `Keyset`, `AsyncTask`,
//! `AuthHeader`) and the shared error taxonomy that every other crate in the
//! workspace builds on.

pub mod admin_action;
pub mod auth_header;
pub mod error;
pub mod keyset;
pub mod lro;
pub mod subscriber;
pub mod subscription;
pub mod subscription_request;
pub mod task;

pub use admin_action::{AdminActionKind, AdminActionRequest};
pub use auth_header::AuthHeader;
pub use keyset::Keyset;
pub use lro::{Lro, LroStatus, LroType};
pub use subscriber::{Role, Subscriber};
pub use subscription::{Subscription, SubscriptionStatus};
pub use subscription_request::SubscriptionRequest;
pub use task::{AsyncTask, BecknContext, TaskType};
