//! Domain errors raised by the registry-side services, each carrying enough
//! information (`ErrorCode::code` plus an explicit `status`) for the HTTP
//! surface to build the `{"error": {...}}` envelope from §7 without
//! re-deriving a status code from a string.

use onix_api::ports::RepositoryError;
use onix_types::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LroError {
    #[error("operation {0} already exists")]
    AlreadyExists(String),
    #[error("no operation found for operation_id {0}")]
    NotFound(String),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl LroError {
    pub fn status(&self) -> u16 {
        match self {
            LroError::AlreadyExists(_) => 409,
            LroError::NotFound(_) => 404,
            LroError::Repository(_) => 500,
        }
    }
}

impl ErrorCode for LroError {
    fn code(&self) -> &'static str {
        match self {
            LroError::AlreadyExists(_) => "OPERATION_ALREADY_EXISTS",
            LroError::NotFound(_) => "OPERATION_NOT_FOUND",
            LroError::Repository(e) => e.code(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            LroError::AlreadyExists(_) => "CONFLICT_ERROR",
            LroError::NotFound(_) => "NOT_FOUND",
            LroError::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

/// Maps a raw [`RepositoryError`] into the sentinel variants the service
/// layer distinguishes by typed comparison (§7: "repository errors ... are
/// sentinel; matched via typed comparison. Any other repo error is mapped
/// to 500").
impl From<RepositoryError> for LroError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::OperationAlreadyExists(id) => LroError::AlreadyExists(id),
            RepositoryError::LroNotFound(id) => LroError::NotFound(id),
            other => LroError::Repository(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("subscription request must not be empty")]
    EmptyRequest,
    #[error("a subscription request with message_id {0} already exists")]
    Duplicate(String),
    #[error(transparent)]
    Lro(#[from] LroError),
}

impl SubscriptionError {
    pub fn status(&self) -> u16 {
        match self {
            SubscriptionError::EmptyRequest => 400,
            SubscriptionError::Duplicate(_) => 409,
            SubscriptionError::Lro(e) => e.status(),
        }
    }
}

impl ErrorCode for SubscriptionError {
    fn code(&self) -> &'static str {
        match self {
            SubscriptionError::EmptyRequest => "INVALID_JSON",
            SubscriptionError::Duplicate(_) => "DUPLICATE_REQUEST",
            SubscriptionError::Lro(e) => e.code(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            SubscriptionError::EmptyRequest => "VALIDATION_ERROR",
            SubscriptionError::Duplicate(_) => "CONFLICT_ERROR",
            SubscriptionError::Lro(e) => e.error_type(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no operation found for operation_id {0}")]
    NotFound(String),
    #[error("operation {0} has exceeded the maximum retry count")]
    MaxRetriesExceeded(String),
    #[error("operation {0} has already reached a terminal state")]
    AlreadyProcessed(String),
    #[error("reject action requires a non-empty reason")]
    MissingReason,
    #[error("{0}")]
    ProcessingFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdminError {
    pub fn status(&self) -> u16 {
        match self {
            AdminError::NotFound(_) => 404,
            AdminError::MaxRetriesExceeded(_) => 400,
            AdminError::AlreadyProcessed(_) => 409,
            AdminError::MissingReason => 400,
            AdminError::ProcessingFailed(_) => 500,
            AdminError::Internal(_) => 500,
        }
    }
}

impl ErrorCode for AdminError {
    fn code(&self) -> &'static str {
        match self {
            AdminError::NotFound(_) => "OPERATION_NOT_FOUND",
            AdminError::MaxRetriesExceeded(_) => "MAX_RETRIES_EXCEEDED",
            AdminError::AlreadyProcessed(_) => "LRO_ALREADY_PROCESSED",
            AdminError::MissingReason => "INVALID_ACTION",
            AdminError::ProcessingFailed(_) => "INTERNAL_SERVER_ERROR",
            AdminError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AdminError::NotFound(_) => "NOT_FOUND",
            AdminError::MaxRetriesExceeded(_) => "VALIDATION_ERROR",
            AdminError::AlreadyProcessed(_) => "CONFLICT_ERROR",
            AdminError::MissingReason => "VALIDATION_ERROR",
            AdminError::ProcessingFailed(_) => "INTERNAL_ERROR",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("key manager error during self-registration: {0}")]
    KeyManager(String),
    #[error("repository error during self-registration: {0}")]
    Repository(String),
}

impl ErrorCode for BootstrapError {
    fn code(&self) -> &'static str {
        "BOOTSTRAP_FAILED"
    }
}
