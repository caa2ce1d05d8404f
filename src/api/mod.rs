//! Public API module
//!
//! Health check and chirp validation endpoints.

use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Chirp submitted for validation
///
/// Decoding is lenient: a missing or `null` body is empty, unknown fields
/// are skipped, and the `body` key matches case-insensitively with the
/// last matching key winning.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChirpRequest {
    pub body: String,
}

impl<'de> Deserialize<'de> for ChirpRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChirpVisitor;

        impl<'de> Visitor<'de> for ChirpVisitor {
            type Value = ChirpRequest;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut chirp = ChirpRequest::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key.eq_ignore_ascii_case("body") {
                        // null leaves the previous value in place
                        if let Some(body) = map.next_value::<Option<String>>()? {
                            chirp.body = body;
                        }
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(chirp)
            }
        }

        deserializer.deserialize_map(ChirpVisitor)
    }
}

/// Decode the first JSON value of a request body into a chirp.
///
/// Anything after the first value is ignored and a top-level `null` is an
/// empty chirp. An empty body is an error.
pub fn decode_chirp(body: &[u8]) -> Result<ChirpRequest, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let chirp = Option::<ChirpRequest>::deserialize(&mut deserializer)?;
    Ok(chirp.unwrap_or_default())
}

/// Successful validation response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidResponse {
    pub valid: bool,
}

/// Error payload returned to clients
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Client-visible API failures
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body did not decode into a chirp
    #[error("Something went wrong")]
    Malformed(#[source] serde_json::Error),
    /// Chirp exceeds the configured byte limit
    #[error("Chirp is too long")]
    ChirpTooLong,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Kept at 500 for compatibility with existing clients.
            ApiError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ChirpTooLong => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Check a decoded chirp against the length limit, counted in bytes
pub fn check_chirp(chirp: &ChirpRequest, max_length: usize) -> Result<(), ApiError> {
    if chirp.body.len() > max_length {
        return Err(ApiError::ChirpTooLong);
    }
    Ok(())
}

/// Chirp validation endpoint
pub async fn validate_chirp(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ValidResponse>, ApiError> {
    let chirp = decode_chirp(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to decode chirp");
        ApiError::Malformed(e)
    })?;

    check_chirp(&chirp, state.config.chirp.max_length)?;

    Ok(Json(ValidResponse { valid: true }))
}

/// Health check endpoint
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}
