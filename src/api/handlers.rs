//! API request handlers

use crate::signals::{SignalError, SignalSeriesService};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub app: AppState,
    pub signals: SignalSeriesService,
}

/// Shared state handed to every handler
pub type GriseraState = Arc<ServerState>;

impl ServerState {
    pub fn new(app: AppState) -> Self {
        let signals = SignalSeriesService::new(app.graph.clone());
        Self { app, signals }
    }

    /// Dataset named by the request, or the configured default
    pub fn dataset<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.app.config.default_dataset.as_str())
    }
}

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness probe
pub async fn health(State(_state): State<GriseraState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

/// API error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    Unprocessable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<SignalError> for AppError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::NotFound { .. } => AppError::NotFound(err.to_string()),
            SignalError::Validation(_) => AppError::Unprocessable(err.to_string()),
            SignalError::Graph(e) => AppError::Internal(e.context("graph mutation failed")),
            SignalError::Transformation(_) => AppError::Internal(anyhow::anyhow!(err.to_string())),
        }
    }
}
