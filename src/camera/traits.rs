use async_trait::async_trait;

use crate::core::errors::DeviceError;

use super::frame::Frame;

/// Capture hardware seam. Callers pair `open`/`release` around one scan
/// session; `read_frame` on a device that was never opened fails with
/// [`DeviceError::NotInitialized`].
#[async_trait]
pub trait CaptureDevice: Send {
    async fn open(&mut self) -> Result<(), DeviceError>;
    async fn read_frame(&mut self) -> Result<Frame, DeviceError>;
    async fn release(&mut self);
}
