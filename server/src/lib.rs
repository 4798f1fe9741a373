pub mod api;
pub mod auth;
pub mod telemetry;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use recipebox_core::{AppConfig, AuthEvent, BackendState};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: BackendState,
}

impl AppState {
    pub fn new(config: AppConfig, backend: BackendState) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    /// Configuration from the environment and the service client it describes.
    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        let backend = BackendState::from_config(&config);
        Self::new(config, backend)
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(api::health::router())
        .merge(api::public::router())
        .merge(api::account::router())
        .nest("/api/categories", api::categories::router())
        .nest("/api/recipes", api::recipes::router())
        .merge(swagger_ui)
        .with_state(state)
        .layer(middleware::from_fn(
            telemetry::remote_call_count_header_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Health probes from load balancers are too frequent to log
                    if matched_path == "/api/health" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(
            telemetry::remote_call_counting_middleware,
        ))
}

/// Log sign-in and sign-out events until the backend's channel closes.
pub fn spawn_session_logger(backend: &BackendState) -> Option<tokio::task::JoinHandle<()>> {
    let BackendState::Ready(backend) = backend else {
        return None;
    };
    let mut events = backend.events().subscribe();

    Some(tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::SignedIn { user_id }) => {
                    tracing::info!("Session started for user {}", user_id)
                }
                Ok(AuthEvent::SignedOut) => tracing::info!("Session ended"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session logger skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    }))
}
