use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::camera::service::CameraService;

use super::handlers;

pub fn build_router(service: Arc<CameraService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/detection/status", get(handlers::status))
        .route("/detection/start", post(handlers::start_detection))
        .route("/detection/stop", post(handlers::stop_detection))
        .route("/detection/start_stream", post(handlers::start_stream))
        .route("/detection/stop_stream", post(handlers::stop_stream))
        .route("/detection/stream", get(handlers::video_feed))
        .route("/detection/take_photo", get(handlers::take_photo))
        .layer(CorsLayer::permissive())
        .with_state(service)
}
