use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    camera::service::CameraService,
    core::{errors::AppError, state::CameraStatus},
};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct OperationResponse {
    success: bool,
    message: &'static str,
}

fn ok(message: &'static str) -> Json<OperationResponse> {
    Json(OperationResponse {
        success: true,
        message,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn status(State(service): State<Arc<CameraService>>) -> Json<CameraStatus> {
    Json(service.get_status())
}

pub async fn start_detection(
    State(service): State<Arc<CameraService>>,
) -> Result<impl IntoResponse, AppError> {
    service.start_scanning().await?;
    Ok(ok("Detection started"))
}

pub async fn stop_detection(
    State(service): State<Arc<CameraService>>,
) -> Result<impl IntoResponse, AppError> {
    service.stop_scanning().await?;
    Ok(ok("Detection stopped"))
}

pub async fn start_stream(
    State(service): State<Arc<CameraService>>,
) -> Result<impl IntoResponse, AppError> {
    service.start_streaming()?;
    Ok(ok("Streaming started"))
}

pub async fn stop_stream(State(service): State<Arc<CameraService>>) -> impl IntoResponse {
    service.stop_streaming();
    ok("Streaming stopped")
}

pub async fn video_feed(State(service): State<Arc<CameraService>>) -> Result<Response, AppError> {
    if !service.is_streaming() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "Streaming is not active",
        ));
    }

    let stream = service.get_frame();

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("multipart/x-mixed-replace; boundary=frame"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

pub async fn take_photo(
    State(service): State<Arc<CameraService>>,
) -> Result<impl IntoResponse, AppError> {
    service.take_photo().await?;
    Ok(ok("Photo captured successfully"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use tempfile::TempDir;

    use crate::{
        camera::{
            frame::Frame,
            service::{CameraService, DeviceFactory},
            traits::CaptureDevice,
        },
        core::{errors::DeviceError, state::CameraState},
    };

    struct IdleDevice;

    #[async_trait]
    impl CaptureDevice for IdleDevice {
        async fn open(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn read_frame(&mut self) -> Result<Frame, DeviceError> {
            std::future::pending().await
        }

        async fn release(&mut self) {}
    }

    fn test_service(input_dir: &TempDir) -> Arc<CameraService> {
        let factory: DeviceFactory =
            Box::new(|| Box::new(IdleDevice) as Box<dyn CaptureDevice>);
        Arc::new(CameraService::new(factory, input_dir.path()))
    }

    #[tokio::test]
    async fn status_reports_stopped_before_any_operation() {
        let dir = TempDir::new().expect("tempdir should create");
        let response = super::status(State(test_service(&dir))).await;
        assert_eq!(response.0.state, CameraState::Stopped);
        assert!(!response.0.streaming);
    }

    #[tokio::test]
    async fn video_feed_rejects_when_streaming_inactive() {
        let dir = TempDir::new().expect("tempdir should create");
        let result = super::video_feed(State(test_service(&dir))).await;
        let err = result.err().expect("feed should be rejected");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn start_and_stop_round_trip_through_handlers() {
        let dir = TempDir::new().expect("tempdir should create");
        let service = test_service(&dir);

        super::start_detection(State(service.clone()))
            .await
            .expect("start should succeed");
        assert_eq!(service.get_status().state, CameraState::Running);

        super::stop_detection(State(service.clone()))
            .await
            .expect("stop should succeed");
        assert_eq!(service.get_status().state, CameraState::Stopped);
    }
}
