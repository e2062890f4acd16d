use std::{env, net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub camera_device: String,
    pub camera_input_format: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub stream_interval_ms: u64,
    pub input_dir: PathBuf,
    pub verify_image: PathBuf,
    pub report_url: String,
    pub detector_command: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_owned())
            .parse()?;
        let camera_device = env::var("CAMERA_DEVICE").unwrap_or_else(|_| "/dev/video0".to_owned());
        let camera_input_format =
            env::var("CAMERA_INPUT_FORMAT").unwrap_or_else(|_| "mjpeg".to_owned());
        let frame_width = env::var("FRAME_WIDTH")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(640);
        let frame_height = env::var("FRAME_HEIGHT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(480);
        let stream_interval_ms = env::var("STREAM_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(33);
        let input_dir = env::var("INPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("inputs"));
        let verify_image = env::var("VERIFY_IMAGE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("test_img.jpg"));
        let report_url = env::var("REPORT_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api/v1/metal-products/create".to_owned());
        let detector_command = env::var("DETECTOR_COMMAND")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr,
            camera_device,
            camera_input_format,
            frame_width,
            frame_height,
            stream_interval_ms,
            input_dir,
            verify_image,
            report_url,
            detector_command,
        })
    }
}
