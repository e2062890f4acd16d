use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use crate::{
    core::{
        errors::ServiceError,
        state::{CameraState, CameraStatus},
    },
    detect::Detector,
};

use super::{
    encode::{encode_jpeg, multipart_chunk},
    frame::FrameBuffer,
    traits::CaptureDevice,
};

/// Bounded wait for the capture task during graceful shutdown. A slower
/// device read may overrun this; shutdown proceeds and the task releases
/// the device on its own once the read returns.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

pub type DeviceFactory = Box<dyn Fn() -> Box<dyn CaptureDevice> + Send + Sync>;

pub type FrameStream = ReceiverStream<Result<Bytes, std::io::Error>>;

/// One scanning episode: the cancel signal and the capture task it controls.
/// The task owns the device handle and releases it on every exit path.
struct ScanSession {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// State shared between the facade, the capture loop and stream readers.
/// The flags are the single source of truth; every status replacement
/// re-derives its `streaming` field from them.
struct Shared {
    buffer: FrameBuffer,
    status: Mutex<CameraStatus>,
    scanning: AtomicBool,
    streaming: AtomicBool,
}

impl Shared {
    fn update_status(&self, state: CameraState, message: impl Into<String>) {
        let message = message.into();
        info!("status updated: {state:?} - {message}");
        let status = CameraStatus::new(state, message, self.streaming.load(Ordering::SeqCst));
        *self.status.lock() = status;
    }
}

/// Orchestration facade over the capture device, the latest-frame buffer
/// and the lifecycle state machine. Safe to share behind an `Arc` and call
/// from arbitrary concurrent tasks.
pub struct CameraService {
    shared: Arc<Shared>,
    session: tokio::sync::Mutex<Option<ScanSession>>,
    make_device: DeviceFactory,
    detector: Option<Arc<dyn Detector>>,
    input_dir: PathBuf,
    verify_image: PathBuf,
    stream_interval: Duration,
}

impl CameraService {
    pub fn new(make_device: DeviceFactory, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer: FrameBuffer::default(),
                status: Mutex::new(CameraStatus::default()),
                scanning: AtomicBool::new(false),
                streaming: AtomicBool::new(false),
            }),
            session: tokio::sync::Mutex::new(None),
            make_device,
            detector: None,
            input_dir: input_dir.into(),
            verify_image: PathBuf::from("test_img.jpg"),
            stream_interval: Duration::from_millis(33),
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_verify_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.verify_image = path.into();
        self
    }

    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        self.stream_interval = interval;
        self
    }

    /// Open the device and spawn the capture loop. Fails without side
    /// effects while a session is active. The initial verification image is
    /// dispatched to the detector fire-and-forget; its outcome never rolls
    /// back the scanning state.
    pub async fn start_scanning(&self) -> Result<(), ServiceError> {
        let mut session = self.session.lock().await;
        if self.shared.scanning.load(Ordering::SeqCst) {
            warn!("scanning already in progress");
            return Err(ServiceError::AlreadyScanning);
        }
        // A session whose loop died on a read failure leaves its handle
        // behind; the task has already finished, so just drop it.
        drop(session.take());

        let mut device = (self.make_device)();
        if let Err(err) = device.open().await {
            error!("failed to open capture device: {err}");
            self.shared
                .update_status(CameraState::Error, err.to_string());
            return Err(err.into());
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.shared.scanning.store(true, Ordering::SeqCst);
        self.shared.streaming.store(false, Ordering::SeqCst);
        let task = tokio::spawn(capture_loop(device, self.shared.clone(), cancel_rx));
        *session = Some(ScanSession { cancel_tx, task });

        self.shared
            .update_status(CameraState::Running, "Scanning started");
        info!("scanning started");
        self.dispatch_detection(self.verify_image.clone());
        Ok(())
    }

    /// Stop streaming, signal the capture loop and wait for it with a
    /// bounded join. Exactly one of several concurrent callers performs the
    /// transition; the rest fail with `NotScanning`.
    pub async fn stop_scanning(&self) -> Result<(), ServiceError> {
        let mut session_slot = self.session.lock().await;
        if !self.shared.scanning.load(Ordering::SeqCst) {
            warn!("no scanning in progress");
            return Err(ServiceError::NotScanning);
        }
        let Some(session) = session_slot.take() else {
            self.shared.scanning.store(false, Ordering::SeqCst);
            return Err(ServiceError::NotScanning);
        };

        self.stop_streaming();
        self.shared.scanning.store(false, Ordering::SeqCst);
        let _ = session.cancel_tx.send(true);
        if timeout(JOIN_TIMEOUT, session.task).await.is_err() {
            warn!(
                "capture task did not stop within {JOIN_TIMEOUT:?}; device release deferred to the task"
            );
        }

        self.shared
            .update_status(CameraState::Stopped, "Scanning stopped");
        info!("scanning stopped");
        Ok(())
    }

    pub fn start_streaming(&self) -> Result<(), ServiceError> {
        if !self.shared.scanning.load(Ordering::SeqCst) {
            warn!("cannot start streaming: scanning not active");
            return Err(ServiceError::NotScanning);
        }
        self.shared.streaming.store(true, Ordering::SeqCst);
        self.shared
            .update_status(CameraState::Running, "Streaming started");
        info!("streaming started");
        Ok(())
    }

    /// Always succeeds; stopping an inactive stream is a no-op.
    pub fn stop_streaming(&self) {
        self.shared.streaming.store(false, Ordering::SeqCst);
        let state = self.shared.status.lock().state;
        self.shared.update_status(state, "Streaming stopped");
        info!("streaming stopped");
    }

    /// Persist the latest frame under the inputs directory and hand the
    /// file to the detector. Success reflects the capture and persist step
    /// only; detection runs fire-and-forget.
    pub async fn take_photo(&self) -> Result<PathBuf, ServiceError> {
        if !self.shared.scanning.load(Ordering::SeqCst) {
            warn!("cannot take photo: scanning not active");
            return Err(ServiceError::NotScanning);
        }
        let Some(frame) = self.shared.buffer.snapshot() else {
            warn!("no frame available for photo");
            return Err(ServiceError::FrameUnavailable);
        };

        let jpeg = encode_jpeg(&frame)?;
        let file_name = format!("img_{}.jpg", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.input_dir.join(file_name);
        tokio::fs::write(&path, &jpeg).await?;
        info!("photo saved to {}", path.display());

        self.dispatch_detection(path.clone());
        Ok(path)
    }

    /// Lazy, non-restartable sequence of multipart frame chunks. Produces
    /// while scanning and streaming both hold, samples the frame buffer on
    /// a fixed interval and skips frames already sent. Terminates when
    /// either flag drops, on encode failure, or when the consumer goes
    /// away. Concurrent streams are independent readers.
    pub fn get_frame(&self) -> FrameStream {
        let (tx, rx) = mpsc::channel::<Result<Bytes, std::io::Error>>(2);
        let shared = self.shared.clone();
        let interval = self.stream_interval;

        tokio::spawn(async move {
            let mut last_sent = None;
            while shared.scanning.load(Ordering::SeqCst) && shared.streaming.load(Ordering::SeqCst)
            {
                if let Some(frame) = shared.buffer.snapshot() {
                    if last_sent.is_none_or(|sent| frame.captured_at > sent) {
                        let jpeg = match encode_jpeg(&frame) {
                            Ok(jpeg) => jpeg,
                            Err(err) => {
                                warn!("failed to encode stream frame: {err}");
                                break;
                            }
                        };
                        last_sent = Some(frame.captured_at);
                        if tx.send(Ok(multipart_chunk(&jpeg))).await.is_err() {
                            break;
                        }
                    }
                }
                sleep(interval).await;
            }
            info!("frame stream closed");
        });

        ReceiverStream::new(rx)
    }

    pub fn get_status(&self) -> CameraStatus {
        self.shared.status.lock().clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.shared.scanning.load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.streaming.load(Ordering::SeqCst)
    }

    fn dispatch_detection(&self, path: PathBuf) {
        let Some(detector) = self.detector.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = detector.process(&path).await {
                error!("defect detection failed for {}: {err}", path.display());
            }
        });
    }
}

/// Background acquisition loop. Publishes every successful read into the
/// frame buffer; a single failed read is fatal to the session: it clears
/// both flags, transitions the status to `Error` and ends the loop. The
/// loop never unwinds across its task boundary.
async fn capture_loop(
    mut device: Box<dyn CaptureDevice>,
    shared: Arc<Shared>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = cancel_rx.changed() => break,
            read = device.read_frame() => match read {
                Ok(frame) => shared.buffer.publish(frame),
                Err(err) => {
                    error!("frame capture failed: {err}");
                    shared.streaming.store(false, Ordering::SeqCst);
                    shared.scanning.store(false, Ordering::SeqCst);
                    shared.update_status(CameraState::Error, err.to_string());
                    break;
                }
            }
        }
    }

    device.release().await;
    shared.buffer.clear();
}
