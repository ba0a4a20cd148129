//! Identa is a minimal identity service: users register, open and close
//! sessions with opaque tokens, and edit their own profile.

#![forbid(unsafe_code)]
pub mod config;
pub mod crypto;
mod database;
pub mod error;
mod router;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

pub use error::ServerError;

use crate::crypto::PasswordManager;
use crate::user::{IdentityService, MemoryStore, PostgresStore, UserStore};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub identity: Arc<IdentityService>,
    /// Prometheus handle, `None` if no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `GET /metrics` goes to Prometheus exposition.
        .route("/metrics", get(telemetry::metrics))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        // `PUT /logout` goes to `logout`.
        .route("/logout", put(router::logout::handler))
        .merge(router::users::router())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let store: Arc<dyn UserStore> = match config.postgres {
        Some(ref postgres) => {
            let db = database::Database::from_config(postgres).await?;
            Arc::new(PostgresStore::new(db.postgres))
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, users are kept in memory"
            );
            Arc::new(MemoryStore::new())
        },
    };

    let passwords = PasswordManager::new(config.argon2.clone())?;

    Ok(AppState {
        config,
        identity: Arc::new(IdentityService::new(store, passwords)),
        metrics,
    })
}
