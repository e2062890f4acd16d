use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStdout, Command},
};
use tracing::warn;

use crate::core::errors::DeviceError;

use super::{frame::Frame, traits::CaptureDevice};

/// Capture device backed by an ffmpeg subprocess that decodes the camera
/// stream to raw RGB24 frames on stdout. One fixed-size read per frame.
pub struct FfmpegDevice {
    device: String,
    input_format: String,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl FfmpegDevice {
    pub fn new(device: String, input_format: String, width: u32, height: u32) -> Self {
        Self {
            device,
            input_format,
            width,
            height,
            child: None,
            stdout: None,
        }
    }

    fn frame_len(&self) -> usize {
        (self.width * self.height * 3) as usize
    }
}

#[async_trait]
impl CaptureDevice for FfmpegDevice {
    async fn open(&mut self) -> Result<(), DeviceError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new("ffmpeg")
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-f",
                "v4l2",
                "-input_format",
                &self.input_format,
                "-video_size",
                &format!("{}x{}", self.width, self.height),
                "-i",
                &self.device,
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "pipe:1",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| DeviceError::Open(err.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeviceError::Open("missing ffmpeg stdout pipe".to_owned()))?;

        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        let frame_len = self.frame_len();
        let stdout = self.stdout.as_mut().ok_or(DeviceError::NotInitialized)?;

        let mut data = vec![0_u8; frame_len];
        stdout
            .read_exact(&mut data)
            .await
            .map_err(|err| DeviceError::Read(err.to_string()))?;

        Ok(Frame::new(self.width, self.height, Bytes::from(data)))
    }

    async fn release(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill().await {
                warn!("failed to kill ffmpeg capture child: {err}");
            }
            if let Err(err) = child.wait().await {
                warn!("failed to wait ffmpeg capture child: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{camera::traits::CaptureDevice, core::errors::DeviceError};

    use super::FfmpegDevice;

    #[tokio::test]
    async fn read_before_open_reports_not_initialized() {
        let mut device = FfmpegDevice::new("/dev/video0".to_owned(), "mjpeg".to_owned(), 640, 480);
        let err = device
            .read_frame()
            .await
            .expect_err("read on a closed device should fail");
        assert!(matches!(err, DeviceError::NotInitialized));
    }

    #[tokio::test]
    async fn release_without_open_is_a_no_op() {
        let mut device = FfmpegDevice::new("/dev/video0".to_owned(), "mjpeg".to_owned(), 640, 480);
        device.release().await;
    }
}
