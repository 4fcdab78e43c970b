use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use idportal::{PortalError, StorageError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Portal(e) => match e {
                PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
                PortalError::Storage(
                    StorageError::DocumentNotFound(_) | StorageError::InvalidDocumentId(_),
                ) => StatusCode::NOT_FOUND,
                PortalError::InvalidTransition { .. } => StatusCode::CONFLICT,
                PortalError::DateOfBirthMismatch => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Portal(PortalError::Validation(errors)) => json!({
                "success": false,
                "message": errors.to_string(),
                "errors": errors.issues,
            }),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
                json!({ "success": false, "message": "Internal server error" })
            }
            _ => json!({ "success": false, "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
