//! The Registry service's axum HTTP surface: exercises `onix-registry-core`
//! end to end the way `http-rpc-gateway` exercises `IbcHost` — a thin router
//! over a real engine, no business logic of its own.

pub mod config;
pub mod error;
pub mod events;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, patch, post};
use axum::{BoxError, Router};
use onix_api::crypto::{Encryptor, SignValidator};
use onix_api::ports::{EventPublisher, NpClient, RegistryRepository};
use onix_auth::SubscriptionAuthenticator;
use onix_registry_core::challenge_source::OsChallengeSource;
use onix_registry_core::{AdminEngine, LroService, SubscriptionService};
use onix_types::subscription::SubscriptionFilter;
use onix_types::{AdminActionKind, AdminActionRequest};
use serde::Serialize;
use tokio::sync::watch;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const WWW_AUTHENTICATE_SUBSCRIBER: HeaderName = HeaderName::from_static("www-authenticate-subscriber");
const BODY_LIMIT_BYTES: usize = 1 << 20;

#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Arc<SubscriptionService>,
    pub lro_service: Arc<LroService>,
    pub admin: Arc<AdminEngine>,
    pub authenticator: Arc<SubscriptionAuthenticator>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn RegistryRepository>,
        events: Arc<dyn EventPublisher>,
        encryptor: Arc<dyn Encryptor>,
        np_client: Arc<dyn NpClient>,
        validator: Arc<dyn SignValidator>,
        operation_retry_max: u32,
    ) -> Self {
        Self {
            subscriptions: Arc::new(SubscriptionService::new(repository.clone(), events.clone())),
            lro_service: Arc::new(LroService::new(repository.clone())),
            admin: Arc::new(AdminEngine::new(
                repository.clone(),
                encryptor,
                np_client,
                events,
                Arc::new(OsChallengeSource),
                operation_retry_max,
            )),
            authenticator: Arc::new(SubscriptionAuthenticator::new(repository, validator)),
        }
    }
}

#[derive(Serialize)]
struct SubscribeResponse {
    message_id: String,
    status: &'static str,
}

async fn subscribe_handler(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<SubscribeResponse>, AppError> {
    let request = serde_json::from_slice(&body).map_err(|e| AppError::invalid_json(e.to_string()))?;
    let lro = state.subscriptions.create(Some(request)).await?;
    Ok(Json(SubscribeResponse {
        message_id: lro.operation_id,
        status: "UNDER_SUBSCRIPTION",
    }))
}

async fn update_subscribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<SubscribeResponse>, Response> {
    let authorization = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let request = match state.authenticator.authenticate(&body, authorization).await {
        Ok(req) => req,
        Err(e) => {
            let status = StatusCode::from_u16(e.status).unwrap_or(StatusCode::UNAUTHORIZED);
            let hint = e.subscriber_id_hint.clone().unwrap_or_default();
            let mut response =
                (status, Json(onix_types::error::ErrorEnvelope::from(onix_types::error::ErrorBody::from_code(&e))))
                    .into_response();
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE_SUBSCRIBER, format!("Signature realm=\"{hint}\"").parse().unwrap());
            return Err(response);
        }
    };

    let lro = state
        .subscriptions
        .update(Some(request))
        .await
        .map_err(|e| AppError::from(e).into_response())?;
    Ok(Json(SubscribeResponse {
        message_id: lro.operation_id,
        status: "UNDER_SUBSCRIPTION",
    }))
}

async fn lookup_handler(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> Result<Json<Vec<onix_types::Subscription>>, AppError> {
    let filter: SubscriptionFilter = if body.is_empty() {
        SubscriptionFilter::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::invalid_json(e.to_string()))?
    };
    let matches = state.subscriptions.lookup(&filter).await?;
    Ok(Json(matches))
}

async fn get_operation_handler(
    State(state): State<AppState>,
    Path(operation_id): Path<String>,
) -> Result<Json<onix_types::Lro>, AppError> {
    let lro = state.lro_service.get(&operation_id).await?;
    Ok(Json(lro))
}

async fn admin_action_handler(
    State(state): State<AppState>,
    Json(req): Json<AdminActionRequest>,
) -> Result<Json<onix_types::Lro>, AppError> {
    let lro = match req.action {
        AdminActionKind::ApproveSubscription => state.admin.approve_subscription(&req.operation_id).await?,
        AdminActionKind::RejectSubscription => state.admin.reject_subscription(&req.operation_id, req.reason).await?,
    };
    Ok(Json(lro))
}

async fn map_middleware_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/subscribe", post(subscribe_handler))
        .route("/subscribe", patch(update_subscribe_handler))
        .route("/lookup", post(lookup_handler))
        .route("/operations/:operation_id", get(get_operation_handler))
        .route("/operations/action", post(admin_action_handler))
        .merge(onix_telemetry::admin::admin_router("registry"))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .layer(TimeoutLayer::new(Duration::from_secs(10))),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

/// Runs the registry HTTP surface until `shutdown_rx` fires, mirroring the
/// teacher's `run_server` graceful-shutdown pattern.
pub async fn run_server(addr: SocketAddr, state: AppState, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "onix-registry-server", %addr, "registry server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
            tracing::info!(target: "onix-registry-server", "shutting down gracefully");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use onix_testing::{FakeEncryptor, InMemoryRegistryRepository, RecordingEventPublisher, ScriptedNpClient};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(InMemoryRegistryRepository::new()),
            Arc::new(RecordingEventPublisher::new()),
            Arc::new(FakeEncryptor),
            Arc::new(ScriptedNpClient::new()),
            Arc::new(onix_crypto::Ed25519Validator),
            3,
        )
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(test_state());
        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn subscribe_returns_under_subscription() {
        let app = router(test_state());
        let body = serde_json::json!({
            "message_id": "op1",
            "subscriber_id": "bap1",
            "domain": "retail",
            "role": "BAP",
            "url": "http://bap1/cb",
            "unique_key_id": "k1",
            "signing_public_key": "pub",
            "encr_public_key": "epub",
        });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/subscribe")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["status"], "UNDER_SUBSCRIPTION");
        assert_eq!(parsed["message_id"], "op1");
    }

    #[tokio::test]
    async fn lookup_with_empty_body_returns_all() {
        let app = router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/lookup")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_missing_operation_is_404() {
        let app = router(test_state());
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/operations/missing")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reject_without_reason_is_400_invalid_action() {
        let app = router(test_state());
        let action = serde_json::json!({ "operation_id": "op1", "action": "REJECT_SUBSCRIPTION" });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/operations/action")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(action.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
