//! Chirpy - HTTP server with a hit counter and chirp validation
//!
//! A Rust application providing:
//! - Static file serving under a configurable mount
//! - Request counting middleware on instrumented routes
//! - Admin endpoints to read and reset the hit count
//! - Chirp length validation

pub mod admin;
pub mod api;
pub mod config;
pub mod metrics;
pub mod server;

pub use config::{AppConfig, MetricsFormat, RouteLayout, RouteTable};
pub use metrics::HitCounter;
pub use server::{create_server_router, start_server, AppState};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
