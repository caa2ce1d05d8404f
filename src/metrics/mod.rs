//! Hit counter module
//!
//! Counts requests passing through the instrumented routes and renders the
//! admin metrics page.

use crate::config::MetricsFormat;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide request counter.
///
/// Cloning is cheap and every clone observes the same count.
#[derive(Debug, Clone, Default)]
pub struct HitCounter {
    hits: Arc<AtomicU64>,
}

impl HitCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one hit
    pub fn increment(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    /// Current number of hits
    pub fn load(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Set the count back to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::SeqCst);
    }

    /// Render the admin metrics page for the current count
    pub fn render(&self, format: MetricsFormat) -> String {
        render_hits(self.load(), format)
    }
}

/// Render a hit count in the given format
pub fn render_hits(hits: u64, format: MetricsFormat) -> String {
    match format {
        MetricsFormat::Html => format!(
            "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {hits} times!</p>\n  </body>\n</html>"
        ),
        MetricsFormat::Text => format!("Hits: {hits}"),
    }
}

impl MetricsFormat {
    /// Content type the rendered page is served with
    pub fn content_type(self) -> &'static str {
        match self {
            MetricsFormat::Html => "text/html; charset=utf-8",
            MetricsFormat::Text => "text/plain; charset=utf-8",
        }
    }
}
