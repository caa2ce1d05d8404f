//! Admin endpoints
//!
//! Expose and reset the hit counter. These routes are not authenticated.

use crate::server::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

/// Render the current hit count
pub async fn get_hits(State(state): State<AppState>) -> impl IntoResponse {
    let format = state.config.metrics_format();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        state.hits.render(format),
    )
}

/// Reset the hit count to zero
pub async fn reset_hits(State(state): State<AppState>) -> impl IntoResponse {
    let previous = state.hits.load();
    state.hits.reset();
    tracing::info!(previous = %previous, "Hit counter reset");

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}
