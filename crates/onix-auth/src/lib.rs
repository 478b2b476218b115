//! HTTP-signature header codec, signed-header generation, and the two
//! signature verifiers (subscription-side, transaction-side) that together
//! make up the authenticated request pipeline.

pub mod authgen;
pub mod error;
pub mod header;
pub mod verify;

pub use authgen::AuthGen;
pub use error::AuthError;
pub use verify::{SubscriptionAuthenticator, TransactionAuthenticator};
