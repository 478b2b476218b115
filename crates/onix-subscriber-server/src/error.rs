//! HTTP-boundary error mapping, mirroring `onix-registry-server`'s
//! `AppError`/`IntoResponse` pairing for the subscriber (NP) surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use onix_subscriber_core::SubscriberError;
use onix_types::error::{ErrorBody, ErrorCode, ErrorEnvelope};

pub struct AppError {
    status: u16,
    body: ErrorBody,
}

impl AppError {
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ErrorBody {
                error_type: "VALIDATION_ERROR",
                code: "INVALID_JSON",
                message: message.into(),
                path: None,
            },
        }
    }
}

impl From<SubscriberError> for AppError {
    fn from(err: SubscriberError) -> Self {
        let status = err.status();
        Self {
            status,
            body: ErrorBody::from_code(&err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(target: "onix-subscriber-server", code = self.body.code, message = %self.body.message, "request failed");
        }
        (status, Json(ErrorEnvelope::from(self.body))).into_response()
    }
}
