//! Shared error taxonomy: the `ErrorCode` trait every domain error enum in
//! the workspace implements, plus the envelope shape used to serialize them
//! at the HTTP boundary.

use serde::Serialize;

/// Implemented by every domain error enum so the HTTP layer can build a
/// uniform `{type, code, message, path}` body without matching on concrete
/// error types.
pub trait ErrorCode: std::error::Error {
    /// Stable machine-readable identifier, e.g. `"LRO_ALREADY_PROCESSED"`.
    fn code(&self) -> &'static str;

    /// Broad error category used as the envelope's `type` field, e.g.
    /// `"CORE-ERROR"`, `"VALIDATION-ERROR"`, `"AUTH-ERROR"`.
    fn error_type(&self) -> &'static str {
        "CORE-ERROR"
    }
}

/// The wire shape for error responses, shared across both HTTP surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorBody {
    pub fn from_code<E: ErrorCode>(err: &E) -> Self {
        Self {
            error_type: err.error_type(),
            code: err.code(),
            message: err.to_string(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl From<ErrorBody> for ErrorEnvelope {
    fn from(error: ErrorBody) -> Self {
        Self { error }
    }
}
