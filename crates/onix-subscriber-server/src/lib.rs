//! The Subscriber (NP) service's axum HTTP surface: exercises
//! `onix-subscriber-core` end to end, mirroring `onix-registry-server`'s
//! router/middleware shape.

pub mod config;
pub mod error;
pub mod events;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{patch, post};
use axum::{BoxError, Json, Router};
use onix_subscriber_core::{OnSubscribeRequest, SubscriberService};
use onix_types::{Lro, SubscriptionRequest};
use serde::Deserialize;
use tokio::sync::watch;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const BODY_LIMIT_BYTES: usize = 1 << 20;

#[derive(Clone)]
pub struct AppState {
    pub subscriber: Arc<SubscriberService>,
}

impl AppState {
    pub fn new(subscriber: SubscriberService) -> Self {
        Self {
            subscriber: Arc::new(subscriber),
        }
    }
}

async fn subscribe_handler(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<String>), AppError> {
    let operation_id = state.subscriber.create_subscription(req).await?;
    Ok((StatusCode::ACCEPTED, Json(operation_id)))
}

async fn update_subscribe_handler(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<String>), AppError> {
    let operation_id = state.subscriber.update_subscription(req).await?;
    Ok((StatusCode::ACCEPTED, Json(operation_id)))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    operation_id: String,
}

async fn update_status_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Lro>, AppError> {
    let lro = state.subscriber.update_status(&req.operation_id).await?;
    Ok(Json(lro))
}

async fn on_subscribe_handler(
    State(state): State<AppState>,
    Json(req): Json<OnSubscribeRequest>,
) -> Result<Json<onix_subscriber_core::OnSubscribeResponse>, AppError> {
    let response = state.subscriber.on_subscribe(req).await?;
    Ok(Json(response))
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
        .route("/updateStatus", post(update_status_handler))
        .route("/on_subscribe", post(on_subscribe_handler))
        .route("/v1/on_subscribe", post(on_subscribe_handler))
        .merge(onix_telemetry::admin::admin_router("subscriber"))
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

/// Runs the subscriber HTTP surface until `shutdown_rx` fires.
pub async fn run_server(addr: SocketAddr, state: AppState, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "onix-subscriber-server", %addr, "subscriber server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_rx.changed().await.ok();
            tracing::info!(target: "onix-subscriber-server", "shutting down gracefully");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use onix_api::crypto::Encryptor;
    use onix_api::ports::KeyManager;
    use onix_testing::{FakeDecrypter, FakeEncryptor, FakeSigner, InMemoryKeyManager, RecordingEventPublisher, ScriptedRegistryClient};
    use tower::ServiceExt;

    fn test_state() -> (AppState, Arc<InMemoryKeyManager>) {
        let keys = Arc::new(InMemoryKeyManager::new());
        let registry_client = Arc::new(
            ScriptedRegistryClient::new()
                .with_subscribe_response(serde_json::json!({ "message_id": "op1", "status": "UNDER_SUBSCRIPTION" }))
                .with_update_response(serde_json::json!({ "message_id": "op1", "status": "UNDER_SUBSCRIPTION" })),
        );
        let events = Arc::new(RecordingEventPublisher::new());
        let service = SubscriberService::new(
            keys.clone(),
            registry_client,
            Arc::new(FakeDecrypter::new(keys.clone())),
            Arc::new(FakeSigner::new(keys.clone())),
            events,
            "registry",
            "registry-key",
        );
        (AppState::new(service), keys)
    }

    fn request_body() -> serde_json::Value {
        serde_json::json!({
            "message_id": "",
            "subscriber_id": "bap1",
            "domain": "retail",
            "role": "BAP",
            "url": "http://bap1/cb",
            "unique_key_id": "",
            "signing_public_key": "",
            "encr_public_key": "",
        })
    }

    #[tokio::test]
    async fn health_reports_subscriber_service() {
        let (state, _keys) = test_state();
        let app = router(state);
        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["service"], "subscriber");
    }

    #[tokio::test]
    async fn subscribe_returns_202_with_bare_operation_id() {
        let (state, _keys) = test_state();
        let app = router(state);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/subscribe")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(request_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.is_string());
        assert!(!parsed.as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_subscribe_with_unknown_message_id_is_404() {
        let (state, _keys) = test_state();
        let app = router(state);
        let body = serde_json::json!({ "message_id": "missing", "challenge": "irrelevant" });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/on_subscribe")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn on_subscribe_aliased_under_v1_answers_the_challenge() {
        let (state, keys) = test_state();
        let app = router(state.clone());

        let subscribe_response = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/subscribe")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(request_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = subscribe_response.into_body().collect().await.unwrap().to_bytes();
        let message_id: String = serde_json::from_slice(&bytes).unwrap();

        let staged = keys.get_staged_keyset(&message_id).await.unwrap();
        let challenge = FakeEncryptor.encrypt(&staged.encr_public, b"answer-me").await.unwrap();
        let body = serde_json::json!({ "message_id": message_id, "challenge": challenge });
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/v1/on_subscribe")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["answer"], "answer-me");
    }
}
