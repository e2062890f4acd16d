use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// One decoded RGB24 frame as delivered by the capture device.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        }
    }
}

/// Single-slot store for the most recent frame. New frames overwrite the
/// slot; readers get a clone. There is no waiting and no queueing — only
/// the latest frame matters to a live inspection station.
#[derive(Default)]
pub struct FrameBuffer {
    slot: Mutex<Option<Frame>>,
}

impl FrameBuffer {
    pub fn publish(&self, frame: Frame) {
        *self.slot.lock() = Some(frame);
    }

    pub fn snapshot(&self) -> Option<Frame> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{Frame, FrameBuffer};

    fn frame(tag: u8) -> Frame {
        Frame::new(2, 2, Bytes::from(vec![tag; 12]))
    }

    #[test]
    fn snapshot_of_empty_buffer_is_none() {
        let buffer = FrameBuffer::default();
        assert!(buffer.snapshot().is_none());
    }

    #[test]
    fn publish_overwrites_previous_frame() {
        let buffer = FrameBuffer::default();
        buffer.publish(frame(1));
        buffer.publish(frame(2));

        let latest = buffer.snapshot().expect("buffer should hold a frame");
        assert_eq!(latest.data[0], 2);
    }

    #[test]
    fn successive_frames_have_non_decreasing_timestamps() {
        let buffer = FrameBuffer::default();
        buffer.publish(frame(1));
        let first = buffer.snapshot().expect("first frame").captured_at;
        buffer.publish(frame(2));
        let second = buffer.snapshot().expect("second frame").captured_at;
        assert!(second >= first);
    }

    #[test]
    fn clear_empties_the_slot() {
        let buffer = FrameBuffer::default();
        buffer.publish(frame(1));
        buffer.clear();
        assert!(buffer.snapshot().is_none());
    }
}
