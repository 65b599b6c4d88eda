use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No files were uploaded.")]
    MissingFile,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile | AppError::InvalidFilename(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::MissingFile => "No files were uploaded.".to_string(),
            AppError::InvalidFilename(msg) => format!("Invalid filename: {}", msg),
            AppError::BadRequest(msg) => msg,
            AppError::PayloadTooLarge(msg) => msg,
            AppError::Storage(e) => {
                tracing::error!("Stream error: {:?}", e);
                "Error saving file.".to_string()
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(AppError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidFilename("..".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("bad boundary".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_error_maps_to_500() {
        let err = AppError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_body_limit_maps_to_413() {
        let err = AppError::PayloadTooLarge("length limit exceeded".into());
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
