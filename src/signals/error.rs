//! Error taxonomy of the signal-series engine

use crate::graph_api::NodeId;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors returned by every signal-series operation.
///
/// Graph failures short-circuit the operation that hit them; nothing is
/// rolled back.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Requested node is missing or carries the wrong label
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: NodeId },

    /// A Graph API call reported errors
    #[error("graph mutation failed: {0:#}")]
    Graph(#[from] anyhow::Error),

    /// Malformed input, parameters or transformation name
    #[error("{0}")]
    Validation(String),

    /// Failure inside a transformation function
    #[error("transformation failed: {0}")]
    Transformation(String),
}

impl SignalError {
    pub fn not_found(entity: &'static str, id: NodeId) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
