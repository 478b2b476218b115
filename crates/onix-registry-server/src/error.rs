//! HTTP-boundary error mapping: every domain error the handlers can return
//! implements `onix_types::error::ErrorCode`; this turns that plus an
//! explicit status into the `{"error": {...}}` envelope from §6/§7, the same
//! pairing as the teacher's `AppError`/`IntoResponse` in `http-rpc-gateway`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use onix_registry_core::{AdminError, LroError, SubscriptionError};
use onix_types::error::{ErrorBody, ErrorEnvelope, ErrorCode};

pub struct AppError {
    status: u16,
    body: ErrorBody,
}

impl AppError {
    fn from_code<E: ErrorCode>(status: u16, err: &E, path: Option<&str>) -> Self {
        let mut body = ErrorBody::from_code(err);
        if let Some(path) = path {
            body = body.with_path(path);
        }
        Self { status, body }
    }

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

    pub fn invalid_action(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ErrorBody {
                error_type: "VALIDATION_ERROR",
                code: "INVALID_ACTION",
                message: message.into(),
                path: None,
            },
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.body = self.body.with_path(path);
        self
    }
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        let status = err.status();
        Self::from_code(status, &err, None)
    }
}

impl From<LroError> for AppError {
    fn from(err: LroError) -> Self {
        let status = err.status();
        Self::from_code(status, &err, None)
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        let status = err.status();
        Self::from_code(status, &err, None)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(target: "onix-registry-server", code = self.body.code, message = %self.body.message, "request failed");
        }
        (status, Json(ErrorEnvelope::from(self.body))).into_response()
    }
}
