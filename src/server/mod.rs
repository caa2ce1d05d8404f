//! HTTP Server module
//!
//! Builds the route table, wraps the instrumented routes in the hit
//! counting middleware, and runs the server.

use crate::admin::{get_hits, reset_hits};
use crate::api::{healthz, validate_chirp};
use crate::config::AppConfig;
use crate::metrics::HitCounter;
use anyhow::Context;
use axum::{
    body::Body,
    extract::{FromRef, State},
    http::{header, Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub hits: HitCounter,
}

impl AppState {
    /// Create state with a fresh hit counter
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            hits: HitCounter::new(),
        }
    }
}

impl FromRef<AppState> for HitCounter {
    fn from_ref(state: &AppState) -> Self {
        state.hits.clone()
    }
}

/// Request counting middleware
///
/// The hit is recorded before the wrapped handler runs; the response is
/// passed through untouched.
pub async fn count_hits(
    State(hits): State<HitCounter>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    hits.increment();

    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        count = %hits.load(),
        "Hit recorded"
    );

    next.run(req).await
}

/// Redirect the bare mount path (`/app`) to its directory form (`/app/`)
/// with a 301, before routing reaches the hit counter.
pub async fn redirect_bare_mount(
    State(mount): State<Arc<str>>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    if req.uri().path() != &*mount {
        return next.run(req).await;
    }

    let location = match req.uri().query() {
        Some(query) => format!("{mount}/?{query}"),
        None => format!("{mount}/"),
    };
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Create the main server router
pub fn create_server_router(state: AppState) -> Router {
    let routes = state.config.route_table();
    let files = &state.config.files;
    let mount: Arc<str> = Arc::from(files.mount.trim_end_matches('/'));

    // Static files and health check are counted
    let counted = Router::new()
        .nest_service(&mount, ServeDir::new(&files.root))
        .route(&routes.healthz, get(healthz))
        .route_layer(middleware::from_fn_with_state(state.clone(), count_hits));

    // Validation and admin routes are not
    let uncounted = Router::new()
        .route(&routes.validate_chirp, post(validate_chirp))
        .route(&routes.metrics, get(get_hits))
        .route(&routes.reset, post(reset_hits));

    counted
        .merge(uncounted)
        .with_state(state)
        .layer(middleware::from_fn_with_state(mount, redirect_bare_mount))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server and serve until a shutdown signal arrives
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("Invalid configuration")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_server_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "Serving chirpy");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Signal received, starting graceful shutdown");
}
