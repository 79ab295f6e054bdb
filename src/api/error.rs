use crate::services::storage::StorageError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const MALFORMED_UPLOAD_MESSAGE: &str = "FILE => Malformed Upload!";
pub const STORAGE_FAILURE_MESSAGE: &str = "FILE => Unable to Save File!";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Multipart(e) => {
                tracing::warn!("Malformed upload: {}", e);
                (StatusCode::BAD_REQUEST, MALFORMED_UPLOAD_MESSAGE)
            }
            AppError::Storage(StorageError::Body(e)) => {
                tracing::warn!("Upload body interrupted: {}", e);
                (StatusCode::BAD_REQUEST, MALFORMED_UPLOAD_MESSAGE)
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_FAILURE_MESSAGE)
            }
        };

        (status, message).into_response()
    }
}
