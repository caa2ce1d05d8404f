//! Configuration module for chirpy
//!
//! Supports configuration via defaults, file and environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the server to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Static file serving configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Directory the files are served from
    #[serde(default = "default_root")]
    pub root: String,
    /// Path prefix the directory is mounted under
    #[serde(default = "default_mount")]
    pub mount: String,
}

fn default_root() -> String {
    "./www".to_string()
}

fn default_mount() -> String {
    "/app".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            mount: default_mount(),
        }
    }
}

/// Route table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteLayout {
    /// Health and validation under `/api`, admin routes under `/admin`
    #[default]
    Api,
    /// Every route at the top level
    Flat,
}

/// Route configuration. Unset paths fall back to the layout's defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutesConfig {
    #[serde(default)]
    pub layout: RouteLayout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_chirp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
}

/// Fully resolved route paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    pub healthz: String,
    pub validate_chirp: String,
    pub metrics: String,
    pub reset: String,
}

impl RouteTable {
    /// Default paths for a layout
    pub fn for_layout(layout: RouteLayout) -> Self {
        match layout {
            RouteLayout::Api => Self {
                healthz: "/api/healthz".to_string(),
                validate_chirp: "/api/validate_chirp".to_string(),
                metrics: "/admin/metrics".to_string(),
                reset: "/admin/reset".to_string(),
            },
            RouteLayout::Flat => Self {
                healthz: "/healthz".to_string(),
                validate_chirp: "/validate_chirp".to_string(),
                metrics: "/metrics".to_string(),
                reset: "/reset".to_string(),
            },
        }
    }

    fn paths(&self) -> [(&'static str, &str); 4] {
        [
            ("healthz", self.healthz.as_str()),
            ("validate_chirp", self.validate_chirp.as_str()),
            ("metrics", self.metrics.as_str()),
            ("reset", self.reset.as_str()),
        ]
    }
}

impl RoutesConfig {
    /// Resolve the layout defaults with any per-route overrides applied
    pub fn resolve(&self) -> RouteTable {
        let defaults = RouteTable::for_layout(self.layout);
        RouteTable {
            healthz: self.healthz.clone().unwrap_or(defaults.healthz),
            validate_chirp: self
                .validate_chirp
                .clone()
                .unwrap_or(defaults.validate_chirp),
            metrics: self.metrics.clone().unwrap_or(defaults.metrics),
            reset: self.reset.clone().unwrap_or(defaults.reset),
        }
    }
}

/// How the admin metrics page is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    Html,
    Text,
}

/// Admin metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    /// Rendering format; the route layout decides when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<MetricsFormat>,
}

/// Chirp validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpConfig {
    /// Maximum chirp length in bytes
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    140
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
        }
    }
}

/// Configuration errors detected after loading
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} path must start with '/': {path:?}")]
    RelativePath { name: &'static str, path: String },
    #[error("static files cannot be mounted at the root path")]
    RootMount,
    #[error("route {0:?} overlaps the static file mount")]
    OverlapsMount(String),
    #[error("route {0:?} is configured more than once")]
    DuplicateRoute(String),
    #[error("chirp max_length must be greater than zero")]
    ZeroMaxLength,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Static file configuration
    #[serde(default)]
    pub files: FilesConfig,
    /// Route table configuration
    #[serde(default)]
    pub routes: RoutesConfig,
    /// Admin metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Chirp validation configuration
    #[serde(default)]
    pub chirp: ChirpConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file (TOML or JSON,
    /// picked by extension) and `CHIRPY_` environment variables, in
    /// increasing precedence.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Try to load .env file (ignore if not found)
        let _ = dotenvy::dotenv();

        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        if std::path::Path::new(path).exists() {
            config = config.add_source(config::File::with_name(path));
        }

        // CHIRPY_SERVER__PORT=9000 style overrides
        config = config.add_source(
            config::Environment::with_prefix("CHIRPY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = config.build()?.try_deserialize()?;
        Ok(app_config)
    }

    /// Resolved route table
    pub fn route_table(&self) -> RouteTable {
        self.routes.resolve()
    }

    /// Method, path and whether the hit counter sees it, one per route.
    /// Static files only answer GET (and HEAD).
    pub fn route_summary(&self) -> Vec<(&'static str, String, bool)> {
        let routes = self.route_table();
        let mount = self.files.mount.trim_end_matches('/');
        vec![
            ("GET", format!("{mount}/*"), true),
            ("GET", routes.healthz, true),
            ("POST", routes.validate_chirp, false),
            ("GET", routes.metrics, false),
            ("POST", routes.reset, false),
        ]
    }

    /// Effective metrics format: explicit setting, else html for the api
    /// layout and plain text for the flat one.
    pub fn metrics_format(&self) -> MetricsFormat {
        self.metrics.format.unwrap_or(match self.routes.layout {
            RouteLayout::Api => MetricsFormat::Html,
            RouteLayout::Flat => MetricsFormat::Text,
        })
    }

    /// Check the invariants the router relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.files.mount.starts_with('/') {
            return Err(ConfigError::RelativePath {
                name: "files.mount",
                path: self.files.mount.clone(),
            });
        }
        let mount = self.files.mount.trim_end_matches('/');
        if mount.is_empty() {
            return Err(ConfigError::RootMount);
        }

        let table = self.route_table();
        let mut seen = HashSet::new();
        for (name, path) in table.paths() {
            if !path.starts_with('/') {
                return Err(ConfigError::RelativePath {
                    name,
                    path: path.to_string(),
                });
            }
            if path == mount || path.starts_with(&format!("{mount}/")) {
                return Err(ConfigError::OverlapsMount(path.to_string()));
            }
            if !seen.insert(path) {
                return Err(ConfigError::DuplicateRoute(path.to_string()));
            }
        }

        if self.chirp.max_length == 0 {
            return Err(ConfigError::ZeroMaxLength);
        }
        Ok(())
    }
}
