use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

/// A still frame ready to be sent: base64 JPEG without a data-URI prefix
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub width: u32,
    pub height: u32,
    pub base64: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Video feed is not ready")]
    NotReady,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No images found in {0}")]
    NoFrames(String),
}

/// Encode one frame at its native resolution
pub fn encode_jpeg_base64(frame: &RgbImage, quality: u8) -> Result<EncodedFrame, CaptureError> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(CaptureError::NotReady);
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
        frame.as_raw(),
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;

    Ok(EncodedFrame {
        width,
        height,
        base64: BASE64.encode(&buffer),
    })
}
