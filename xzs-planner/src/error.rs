//! Error types for the planner

use thiserror::Error;

use crate::client::ClientError;

/// Planner-level errors
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Backend request failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Shared library error (config, serialization, I/O)
    #[error(transparent)]
    Common(#[from] xzs_common::Error),

    /// A local validation gate blocked the action (no request was sent)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Durable client storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PlannerError {
    /// True when the failure came from a missing topic on the backend
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlannerError::Client(ClientError::NotFound(_)))
    }
}

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;
