//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay, preflight and health handlers
//! - Wire up middleware (request id, tracing, body limit, CORS)
//! - Bound each invocation by the request deadline
//! - Bind server to listener and serve until shutdown
//! - Hand decoded requests to the operation router

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::config::{RelayConfig, RuntimeConfig};
use crate::error::RelayError;
use crate::http::request::{self, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle::StartupError;
use crate::routing::OperationRouter;
use crate::security::{headers, limits};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<OperationRouter>,
    pub runtime: RuntimeConfig,
    /// Deadline for one invocation, token exchange and retries included.
    pub request_timeout: Duration,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Build the server and its operation router. Fails when the operation
    /// registry is incomplete or the upstream clients cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self, StartupError> {
        let relay = Arc::new(OperationRouter::from_config(&config)?);
        tracing::info!(operations = relay.registry().len(), "Operation registry validated");
        Ok(Self::with_router(config, relay))
    }

    pub fn with_router(config: RelayConfig, relay: Arc<OperationRouter>) -> Self {
        let state = AppState {
            router: relay,
            runtime: config.runtime.clone(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                    operation = Empty,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(limits::body_limit(&config.security));

        let router = Router::new()
            .route("/", post(relay_handler).options(preflight_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(middleware);

        headers::with_cors(router)
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.runtime.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Single operation endpoint.
async fn relay_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = request::request_id(&headers);
    let expose = state.runtime.expose_error_detail();

    let request = match request::decode(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected request body");
            return response::error(&e, expose);
        }
    };
    tracing::Span::current().record("operation", request.operation.as_str());

    let outcome = tokio::time::timeout(state.request_timeout, state.router.dispatch(request))
        .await
        .unwrap_or_else(|_| {
            tracing::warn!(request_id = %request_id, "Operation exceeded request deadline");
            Err(RelayError::Timeout(state.request_timeout))
        });

    match outcome {
        Ok(result) => response::success(result),
        Err(e) => response::error(&e, expose),
    }
}

async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}
