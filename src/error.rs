use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::errors::{ErrorCategory, RoomError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable or returned an unreadable record.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The action was rejected by the room rules.
    #[error(transparent)]
    Room(#[from] RoomError),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
    /// Every drawn room code collided with a live room.
    #[error("no free room code after {0} attempts")]
    RoomCodesExhausted(usize),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            code: "invalid_request",
            message: format!("validation failed: {err}"),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
///
/// Each variant carries the stable code clients switch on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{message}")]
    BadRequest {
        /// Stable error code.
        code: &'static str,
        /// Human readable explanation.
        message: String,
    },
    /// The requester may not perform the action.
    #[error("{message}")]
    Forbidden {
        /// Stable error code.
        code: &'static str,
        /// Human readable explanation.
        message: String,
    },
    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Stable error code.
        code: &'static str,
        /// Human readable explanation.
        message: String,
    },
    /// Conflict with current state.
    #[error("{message}")]
    Conflict {
        /// Stable error code.
        code: &'static str,
        /// Human readable explanation.
        message: String,
    },
    /// Backing store unreachable or too slow.
    #[error("{message}")]
    ServiceUnavailable {
        /// Stable error code.
        code: &'static str,
        /// Human readable explanation.
        message: String,
    },
}

impl AppError {
    /// Stable machine-readable code of the error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::ServiceUnavailable { code, .. } => *code,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => AppError::BadRequest { code, message },
            ErrorCategory::StateConflict => AppError::Conflict { code, message },
            ErrorCategory::NotFound => AppError::NotFound { code, message },
            ErrorCategory::Authorization => AppError::Forbidden { code, message },
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(_) => AppError::ServiceUnavailable {
                code: "storage_unavailable",
                message: "the room store is unavailable, try again shortly".into(),
            },
            ServiceError::Room(err) => err.into(),
            ServiceError::Timeout => AppError::ServiceUnavailable {
                code: "timeout",
                message: "operation timed out".into(),
            },
            ServiceError::RoomCodesExhausted(attempts) => AppError::ServiceUnavailable {
                code: "room_codes_exhausted",
                message: format!("no free room code after {attempts} attempts"),
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
/// Error envelope returned by every failing endpoint.
pub struct ErrorBody {
    /// Failure details.
    pub error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
/// Code and human readable message of a failure.
pub struct ErrorDetail {
    /// Stable machine-readable code.
    pub code: String,
    /// Human readable explanation.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        });

        (status, payload).into_response()
    }
}
