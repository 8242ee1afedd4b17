use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::pickup::PickupStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: PickupStatus,
        to: PickupStatus,
    },

    #[error("cannot {operation} a request in status {status}")]
    InvalidState {
        operation: &'static str,
        status: PickupStatus,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::InvalidState { .. } => "invalid_state",
            AppError::Conflict(_) => "conflict",
            AppError::Storage(_) => "storage_error",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::InvalidState { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            AppError::Validation { field, .. } => body["field"] = json!(field),
            AppError::NotFound { id, .. } => body["id"] = json!(id),
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
