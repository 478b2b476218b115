//! The error shape the authenticated request pipeline surfaces to HTTP
//! handlers: enough to pick a status code, an error-type bucket, a
//! fine-grained code, and (where known) the subscriber the failure concerns.

use onix_types::error::ErrorCode;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AuthError {
    pub status: u16,
    pub error_type: &'static str,
    pub code: &'static str,
    pub message: String,
    pub subscriber_id_hint: Option<String>,
}

impl AuthError {
    fn new(status: u16, error_type: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type,
            code,
            message: message.into(),
            subscriber_id_hint: None,
        }
    }

    pub fn with_subscriber_hint(mut self, subscriber_id: impl Into<String>) -> Self {
        self.subscriber_id_hint = Some(subscriber_id.into());
        self
    }

    pub fn missing_header() -> Self {
        Self::new(401, "AUTH_ERROR", "MISSING_HEADER", "Authorization header is missing")
    }

    pub fn invalid_auth_header(reason: impl Into<String>) -> Self {
        Self::new(401, "AUTH_ERROR", "INVALID_AUTH_HEADER", reason)
    }

    pub fn invalid_json(reason: impl Into<String>) -> Self {
        Self::new(400, "VALIDATION_ERROR", "INVALID_JSON", reason)
    }

    pub fn id_mismatch() -> Self {
        Self::new(
            401,
            "AUTH_ERROR",
            "ID_MISMATCH",
            "header subscriber_id does not match body subscriber_id",
        )
    }

    pub fn subscription_not_found() -> Self {
        Self::new(404, "NOT_FOUND", "SUBSCRIPTION_NOT_FOUND", "no subscription matches the signing key")
    }

    pub fn key_unavailable(reason: impl Into<String>) -> Self {
        Self::new(401, "AUTH_ERROR", "KEY_UNAVAILABLE", reason)
    }

    pub fn invalid_signature() -> Self {
        Self::new(401, "AUTH_ERROR", "INVALID_SIGNATURE", "signature verification failed")
    }

    pub fn key_fetch_failed(reason: impl Into<String>) -> Self {
        Self::new(500, "INTERNAL_ERROR", "KEY_FETCH_FAILED", reason)
    }

    pub fn signing_failed(reason: impl Into<String>) -> Self {
        Self::new(500, "INTERNAL_ERROR", "SIGNING_FAILED", reason)
    }

    /// The `WWW-Authenticate` challenge value emitted alongside 401s from the
    /// subscription-side verifier.
    pub fn www_authenticate(subscriber_id: &str) -> String {
        format!(
            "Signature realm=\"{subscriber_id}\",headers=\"(created) (expires) digest\""
        )
    }
}

impl ErrorCode for AuthError {
    fn code(&self) -> &'static str {
        self.code
    }

    fn error_type(&self) -> &'static str {
        self.error_type
    }
}
