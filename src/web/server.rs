//! Axum router and server loop.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::{RequestAdapter, REQUEST_ID_HEADER};
use crate::config::Settings;
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{ApiError, Status};
use crate::telemetry::{RequestTelemetry, TelemetrySink};

/// Shared state of the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    sink: Arc<dyn TelemetrySink>,
}

impl AppState {
    /// Creates the state from a dispatcher and a telemetry sink.
    pub fn new(dispatcher: Dispatcher, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            sink,
        }
    }
}

/// Builds the router: `POST /method` (with or without trailing slash) goes
/// to the dispatcher, other verbs there get 405, other paths 404.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/method", post(method).fallback(method_not_allowed))
        .route("/method/", post(method).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn request_id_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok())
}

async fn method(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(bytes) => bytes.to_vec(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "request body rejected");
            Vec::new()
        }
    };
    let adapter = RequestAdapter::new(request_id_header(&headers), body);
    let request_id = adapter.request_id().to_string();

    let outcome = match adapter.into_body() {
        Ok(body) => {
            let dispatcher = state.dispatcher.clone();
            let id = request_id.clone();
            match tokio::task::spawn_blocking(move || dispatcher.method_handler(&id, body)).await
            {
                Ok(outcome) => outcome,
                Err(err) => Outcome::error(
                    &ApiError::Internal(err.to_string()),
                    RequestTelemetry::new(&request_id),
                ),
            }
        }
        Err(err) => Outcome::error(&err, RequestTelemetry::new(&request_id)),
    };

    if outcome.status() == Status::InternalError {
        tracing::error!(request_id = %request_id, "request failed with internal error");
    }
    state.sink.record(outcome.telemetry());

    let (status, body, _) = outcome.into_parts();
    respond(&request_id, status, body)
}

async fn method_not_allowed(headers: HeaderMap) -> Response {
    reject(&headers, &ApiError::MethodNotAllowed)
}

async fn not_found(headers: HeaderMap) -> Response {
    reject(&headers, &ApiError::NotFound)
}

fn reject(headers: &HeaderMap, err: &ApiError) -> Response {
    let adapter = RequestAdapter::new(request_id_header(headers), Vec::new());
    let outcome = Outcome::error(err, RequestTelemetry::new(adapter.request_id()));
    tracing::info!(request_id = %adapter.request_id(), status = err.status().code(), "route rejected");

    let (status, body, _) = outcome.into_parts();
    respond(adapter.request_id(), status, body)
}

fn respond(request_id: &str, status: Status, body: Value) -> Response {
    let code = StatusCode::from_u16(status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (code, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let addr = settings.socket_addr()?;
    let app = router(state, settings.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "scoring api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
