use thiserror::Error;

use super::models::PhaseId;

/// Errors that can occur during phase progress operations.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("phase not found: {0}")]
    NotFound(PhaseId),
    #[error("phase store unavailable: {0}")]
    Store(String),
    #[error("malformed phase tree: {0}")]
    MalformedTree(String),
    #[error("phase {0} is already being saved")]
    SaveInProgress(PhaseId),
    #[error("phases have not been loaded")]
    NotLoaded,
    #[error("project already has phases")]
    AlreadyInitialized,
    #[error("{0}")]
    InvalidInput(String),
}

impl PhaseError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
