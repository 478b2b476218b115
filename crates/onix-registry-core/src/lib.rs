//! Registry-side subscription workflow: LRO bookkeeping, subscription
//! intake, the admin approve/reject engine, and self-registration
//! bootstrap (§4.F–§4.I).

pub mod admin;
pub mod bootstrap;
pub mod challenge_source;
pub mod error;
pub mod events;
pub mod lro_service;
pub mod subscription_service;

pub use admin::AdminEngine;
pub use bootstrap::SelfRegistration;
pub use challenge_source::{ChallengeSource, OsChallengeSource};
pub use error::{AdminError, BootstrapError, LroError, SubscriptionError};
pub use lro_service::LroService;
pub use subscription_service::SubscriptionService;
