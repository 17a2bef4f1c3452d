use axum::http::StatusCode;
use thiserror::Error;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}

impl From<ErrorMessage> for ServiceError {
    fn from(message: ErrorMessage) -> Self {
        match message {
            ErrorMessage::HashingError | ErrorMessage::InvalidHashFormat => {
                ServiceError::Other(message.to_string())
            }
            _ => ServiceError::Validation(message.to_string()),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Validation(_)
            | ServiceError::Conflict(_)
            | ServiceError::Authentication(_) => StatusCode::BAD_REQUEST,

            ServiceError::Database(_) | ServiceError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
