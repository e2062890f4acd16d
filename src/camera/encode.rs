use std::io::Cursor;

use bytes::Bytes;
use image::{ExtendedColorType, ImageError, codecs::jpeg::JpegEncoder};

use super::frame::Frame;

const JPEG_QUALITY: u8 = 80;

/// Encode a raw RGB frame into the wire image format.
pub fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), JPEG_QUALITY);
    encoder.encode(
        &frame.data,
        frame.width,
        frame.height,
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Wrap one encoded image as a part of the multipart/x-mixed-replace stream.
pub fn multipart_chunk(jpeg: &[u8]) -> Bytes {
    let mut chunk = Vec::with_capacity(jpeg.len() + 64);
    chunk.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    Bytes::from(chunk)
}
