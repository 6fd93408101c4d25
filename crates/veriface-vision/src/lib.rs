mod capture;
mod detector;
mod feed;
mod onnx_detector;
mod overlay;
mod replay;

pub use capture::{CaptureError, EncodedFrame, encode_jpeg_base64};
pub use detector::{DetectError, FaceDetector, NullDetector};
pub use feed::{Frame, LiveFeed, VideoFeed};
pub use onnx_detector::{DEFAULT_CONFIDENCE, OnnxFaceDetector};
pub use overlay::{BOX_COLOR, LINE_WIDTH, Overlay};
pub use replay::ReplaySource;
