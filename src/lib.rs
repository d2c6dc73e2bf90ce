//! GRISERA signal-series engine
//!
//! A REST service storing time and frequency-domain signal series in a
//! property graph:
//! - Experiment-wide ascending stamp chains shared by every series
//! - Per-series signal value chains
//! - Resampling, quadrant and multidimensional transformations with
//!   provenance links back to their sources

pub mod api;
pub mod experiments;
pub mod graph_api;
pub mod signals;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub graph_api: GraphApiYamlConfig,
    /// Dataset used when a request names none
    pub default_dataset: String,
}

impl Default for YamlConfig {
    fn default() -> Self {
        Self {
            server: ServerYamlConfig::default(),
            graph_api: GraphApiYamlConfig::default(),
            default_dataset: "grisera".into(),
        }
    }
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".into(),
        }
    }
}

/// Graph API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphApiYamlConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for GraphApiYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000".into(),
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub graph_api_url: String,
    pub graph_api_timeout_secs: u64,
    pub default_dataset: String,
}

impl Config {
    /// Load configuration from environment variables and `./config.yaml`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or(yaml.server.host),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            graph_api_url: std::env::var("GRAPH_API_URL").unwrap_or(yaml.graph_api.url),
            graph_api_timeout_secs: std::env::var("GRAPH_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.graph_api.timeout_secs),
            default_dataset: std::env::var("GRISERA_DATASET").unwrap_or(yaml.default_dataset),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<dyn graph_api::GraphStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state backed by the Graph API client
    pub fn new(config: Config) -> Result<Self> {
        let graph = Arc::new(graph_api::GraphApiClient::new(
            &config.graph_api_url,
            Duration::from_secs(config.graph_api_timeout_secs),
        )?);

        Ok(Self {
            graph,
            config: Arc::new(config),
        })
    }
}

/// Bind the configured address and serve the REST API until shutdown
pub async fn start_server(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!(
        graph_api = %config.graph_api_url,
        dataset = %config.default_dataset,
        "Starting GRISERA server"
    );

    let state = AppState::new(config)?;
    let router = api::create_router(Arc::new(api::handlers::ServerState::new(state)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
