use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_detection_interval_ms() -> u64 {
    100
}

fn default_jpeg_quality() -> u8 {
    92
}

fn default_replay_fps() -> u32 {
    15
}

fn default_detector_confidence() -> f32 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Overlay detection period
    #[serde(default = "default_detection_interval_ms")]
    pub detection_interval_ms: u64,
    /// JPEG quality for snapshots sent to the server (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Frame rate used when replaying image files as a video source
    #[serde(default = "default_replay_fps")]
    pub replay_fps: u32,
    /// Image file or directory used as the video source
    pub source: Option<String>,
    /// BlazeFace ONNX model; the overlay stays empty when unset
    pub detector_model: Option<String>,
    /// Minimum face score (0-1)
    #[serde(default = "default_detector_confidence")]
    pub detector_confidence: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: default_detection_interval_ms(),
            jpeg_quality: default_jpeg_quality(),
            replay_fps: default_replay_fps(),
            source: None,
            detector_model: None,
            detector_confidence: default_detector_confidence(),
        }
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self {
            detection_interval_ms: env_or("DETECTION_INTERVAL_MS", default_detection_interval_ms()),
            jpeg_quality: env_or("JPEG_QUALITY", default_jpeg_quality()).clamp(1, 100),
            replay_fps: env_or("REPLAY_FPS", default_replay_fps()).max(1),
            source: std::env::var("VERIFACE_SOURCE").ok(),
            detector_model: std::env::var("DETECTOR_MODEL").ok(),
            detector_confidence: env_or("DETECTOR_CONFIDENCE", default_detector_confidence())
                .clamp(0.0, 1.0),
        }
    }
}
