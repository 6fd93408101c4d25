use image::RgbImage;
use veriface_types::DetectionBox;

/// Face detection capability.
///
/// `load` is awaited once before the feed is attached. `detect` runs on a
/// blocking thread every overlay cycle and must finish well inside the period.
/// Implementations needing per-call state should use interior mutability.
#[async_trait::async_trait]
pub trait FaceDetector: Send + Sync {
    async fn load(&self) -> Result<(), DetectError> {
        Ok(())
    }

    fn detect(&self, frame: &RgbImage) -> Result<Vec<DetectionBox>, DetectError>;

    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Model not loaded")]
    NotLoaded,

    #[error("Model load failed: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Used when no model is configured; never reports a face
pub struct NullDetector;

#[async_trait::async_trait]
impl FaceDetector for NullDetector {
    async fn load(&self) -> Result<(), DetectError> {
        tracing::warn!("No face model configured, overlay will stay empty");
        Ok(())
    }

    fn detect(&self, _frame: &RgbImage) -> Result<Vec<DetectionBox>, DetectError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "null"
    }
}
