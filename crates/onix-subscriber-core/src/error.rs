//! Errors raised by the NP-side subscriber service (§4.J).

use onix_api::crypto::CryptoError;
use onix_api::ports::{KeyManagerError, PublishError, RegistryClientError};
use onix_types::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("key manager error: {0}")]
    KeyManager(#[from] KeyManagerError),
    #[error("registry client error: {0}")]
    RegistryClient(#[from] RegistryClientError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("auth error: {0}")]
    Auth(#[from] onix_auth::AuthError),
}

impl SubscriberError {
    pub fn status(&self) -> u16 {
        match self {
            SubscriberError::InvalidRequest(_) => 400,
            SubscriberError::KeyManager(KeyManagerError::NotFound(_)) => 404,
            SubscriberError::KeyManager(KeyManagerError::Backend(_)) => 500,
            SubscriberError::RegistryClient(RegistryClientError::OperationNotFound(_)) => 404,
            SubscriberError::RegistryClient(_) => 500,
            SubscriberError::Crypto(_) => 500,
            SubscriberError::Auth(e) => e.status,
        }
    }
}

impl ErrorCode for SubscriberError {
    fn code(&self) -> &'static str {
        match self {
            SubscriberError::InvalidRequest(_) => "INVALID_REQUEST",
            SubscriberError::KeyManager(e) => e.code(),
            SubscriberError::RegistryClient(e) => e.code(),
            SubscriberError::Crypto(e) => e.code(),
            SubscriberError::Auth(e) => e.code(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            SubscriberError::InvalidRequest(_) => "VALIDATION_ERROR",
            SubscriberError::KeyManager(KeyManagerError::NotFound(_)) => "NOT_FOUND",
            SubscriberError::KeyManager(KeyManagerError::Backend(_)) => "INTERNAL_ERROR",
            SubscriberError::RegistryClient(RegistryClientError::OperationNotFound(_)) => "NOT_FOUND",
            SubscriberError::RegistryClient(_) => "INTERNAL_ERROR",
            SubscriberError::Crypto(_) => "INTERNAL_ERROR",
            SubscriberError::Auth(e) => e.error_type,
        }
    }
}

/// Logged but never surfaced: the event-publish-failure policy from §7
/// applies equally to the subscriber side.
pub fn log_publish_failure(operation: &str, err: PublishError) {
    tracing::warn!(
        target: "onix-subscriber-core",
        operation,
        error = %err,
        "event publish failed, continuing"
    );
}
