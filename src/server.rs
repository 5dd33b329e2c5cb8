//! Webhook server exposing the pipeline over HTTP
//!
//! Slack posts events to `/events`. Final outcomes keep their own status code
//! (200 or 400); retry-worthy failures answer 503 so the sender tries again.

use crate::error::RelayError;
use crate::event::InboundEvent;
use crate::pipeline::{InvokerResponse, Pipeline};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/events", get(receive_query).post(receive_event))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn receive_event(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<InvokerResponse, RelayError> {
    run(&state.pipeline, payload).await
}

async fn receive_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<InvokerResponse, RelayError> {
    let payload = serde_json::to_value(params)?;
    run(&state.pipeline, payload).await
}

async fn run(pipeline: &Pipeline, payload: Value) -> Result<InvokerResponse, RelayError> {
    pipeline.ensure_configured()?;
    let event = InboundEvent::from_value(payload)?;
    let outcome = pipeline.process(event).await?;
    Ok(outcome.into_response())
}

impl IntoResponse for InvokerResponse {
    fn into_response(self) -> Response {
        let status = self
            .status_code
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::InvalidPayload(_) | RelayError::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %self, status = status.as_u16(), "Invocation failed");
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::translate::{MockMode, MockTranslator};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline(hook_url: Option<String>) -> Arc<Pipeline> {
        let mut config = RelayConfig::from_lookup(|_| None).unwrap();
        config.hook_url = hook_url;
        Arc::new(Pipeline::new(
            &config,
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            reqwest::Client::new(),
        ))
    }

    async fn post(app: Router, body: Value) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(pipeline(None));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let app = router(pipeline(Some("http://127.0.0.1:9/unused".to_string())));
        let (status, body) = post(
            app,
            json!({"type": "url_verification", "challenge": "abc123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"challenge":"abc123"}"#);
    }

    #[tokio::test]
    async fn test_missing_hook_url_is_server_error() {
        let app = router(pipeline(None));
        let (status, body) = post(app, json!({"channel": "C1", "text": "hello"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Hook URL has not been set."));
    }

    #[tokio::test]
    async fn test_missing_hook_url_wins_over_malformed_event() {
        let app = router(pipeline(None));
        let (status, body) = post(app, json!({"event": "oops"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Hook URL has not been set."));
    }

    #[tokio::test]
    async fn test_malformed_event_is_400() {
        let app = router(pipeline(Some("http://127.0.0.1:9/unused".to_string())));
        let (status, _) = post(app, json!({"event": "oops"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejected_delivery_is_400() {
        let slack = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&slack)
            .await;

        let app = router(pipeline(Some(slack.uri())));
        let (status, body) = post(app, json!({"channel": "C1", "text": "hello"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error posting message to Slack API: 403 - Forbidden");
    }

    #[tokio::test]
    async fn test_unavailable_delivery_is_503() {
        let slack = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&slack)
            .await;

        let app = router(pipeline(Some(slack.uri())));
        let (status, _) = post(app, json!({"channel": "C1", "text": "hello"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_query_string_relay_message() {
        let slack = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&slack)
            .await;

        let app = router(pipeline(Some(slack.uri())));
        let request = Request::builder()
            .uri("/events?channel=C1&text=hello")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"]["text"], "hello_en");
    }
}
