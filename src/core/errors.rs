use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("capture device is not initialized")]
    NotInitialized,
    #[error("failed to open capture device: {0}")]
    Open(String),
    #[error("failed to read frame: {0}")]
    Read(String),
}

/// Failures surfaced by the capture service facade. Precondition violations
/// (`AlreadyScanning`, `NotScanning`, `FrameUnavailable`) report the rejected
/// operation; the rest wrap the underlying fault.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("scanning already in progress")]
    AlreadyScanning,
    #[error("scanning is not active")]
    NotScanning,
    #[error("no frame available yet")]
    FrameUnavailable,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to persist snapshot: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "message": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::{AppError, ServiceError};

    #[test]
    fn service_errors_map_to_bad_request() {
        let err = AppError::from(ServiceError::NotScanning);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
