mod camera;
mod config;
mod core;
mod detect;
mod web;

use std::{sync::Arc, time::Duration};

use camera::{
    ffmpeg_backend::FfmpegDevice,
    service::{CameraService, DeviceFactory},
    traits::CaptureDevice,
};
use config::AppConfig;
use detect::{ExternalDetector, report::ReportClient};
use tracing::info;
use tracing_appender::rolling;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tokio::fs::create_dir_all("logs").await?;
    let file_appender = rolling::daily("logs", "inspectcam.log");
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env()?;
    tokio::fs::create_dir_all(&config.input_dir).await?;

    let device_config = config.clone();
    let make_device: DeviceFactory = Box::new(move || {
        Box::new(FfmpegDevice::new(
            device_config.camera_device.clone(),
            device_config.camera_input_format.clone(),
            device_config.frame_width,
            device_config.frame_height,
        )) as Box<dyn CaptureDevice>
    });

    let mut service = CameraService::new(make_device, config.input_dir.clone())
        .with_verify_image(config.verify_image.clone())
        .with_stream_interval(Duration::from_millis(config.stream_interval_ms));
    if let Some(command) = config.detector_command.clone() {
        let reporter = ReportClient::new(config.report_url.clone());
        service = service.with_detector(Arc::new(ExternalDetector::new(command, reporter)));
    }

    let app = web::routes::build_router(Arc::new(service));

    info!("inspection station listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
