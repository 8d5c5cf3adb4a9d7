use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PhaseSaveInProgress,
    PhasesAlreadyInitialized,
    PhasesNotLoaded,
    MalformedPhaseTree,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

use crate::domain::PhaseError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<ErrorCode>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PhaseError> for ApiError {
    fn from(err: PhaseError) -> Self {
        match err {
            PhaseError::NotFound(_) => Self::not_found(err.to_string()),
            PhaseError::Store(ref e) => {
                tracing::error!("Phase store error: {}", e);
                Self::unavailable(err.to_string())
            }
            PhaseError::MalformedTree(_) => {
                Self::unprocessable(err.to_string()).with_code(ErrorCode::MalformedPhaseTree)
            }
            PhaseError::SaveInProgress(_) => {
                Self::conflict(err.to_string()).with_code(ErrorCode::PhaseSaveInProgress)
            }
            PhaseError::NotLoaded => {
                Self::conflict(err.to_string()).with_code(ErrorCode::PhasesNotLoaded)
            }
            PhaseError::AlreadyInitialized => {
                Self::conflict(err.to_string()).with_code(ErrorCode::PhasesAlreadyInitialized)
            }
            PhaseError::InvalidInput(_) => Self::bad_request(err.to_string()),
        }
    }
}
