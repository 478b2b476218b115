//! Errors raised by the task queue and its lookup processor (§4.K/§4.L).

use onix_api::ports::RegistryClientError;
use onix_types::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is shutting down")]
    ShuttingDown,
    #[error("unknown beckn action: {0}")]
    UnknownAction(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("no {0} processor is bound to the queue")]
    NoProcessorBound(String),
    #[error("registry client error: {0}")]
    RegistryClient(#[from] RegistryClientError),
    #[error("auth error: {0}")]
    Auth(#[from] onix_auth::AuthError),
}

impl QueueError {
    pub fn status(&self) -> u16 {
        match self {
            QueueError::ShuttingDown => 503,
            QueueError::UnknownAction(_) | QueueError::BadRequest(_) => 400,
            QueueError::NoProcessorBound(_) => 500,
            QueueError::RegistryClient(_) => 500,
            QueueError::Auth(e) => e.status,
        }
    }
}

impl ErrorCode for QueueError {
    fn code(&self) -> &'static str {
        match self {
            QueueError::ShuttingDown => "QUEUE_SHUTTING_DOWN",
            QueueError::UnknownAction(_) => "UNKNOWN_ACTION",
            QueueError::BadRequest(_) => "BAD_REQUEST",
            QueueError::NoProcessorBound(_) => "NO_PROCESSOR_BOUND",
            QueueError::RegistryClient(e) => e.code(),
            QueueError::Auth(e) => e.code(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            QueueError::ShuttingDown => "INTERNAL_ERROR",
            QueueError::UnknownAction(_) | QueueError::BadRequest(_) => "VALIDATION_ERROR",
            QueueError::NoProcessorBound(_) => "INTERNAL_ERROR",
            QueueError::RegistryClient(_) => "INTERNAL_ERROR",
            QueueError::Auth(e) => e.error_type,
        }
    }
}
