//! BlazeFace (short-range) face detector on ONNX Runtime.
//!
//! The session is created by `load`. Until then every `detect` call fails with
//! [`DetectError::NotLoaded`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use veriface_types::DetectionBox;

use crate::detector::{DetectError, FaceDetector};

/// Model input resolution
const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const NMS_IOU_THRESH: f32 = 0.3;

/// 16x16 grid x 2 + 8x8 grid x 6
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output (box + 6 keypoints)
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxFaceDetector {
    model_path: PathBuf,
    confidence: f32,
    anchors: Vec<[f32; 2]>,
    session: OnceLock<Mutex<Session>>,
}

impl OnnxFaceDetector {
    pub fn new(model_path: impl Into<PathBuf>, confidence: f32) -> Self {
        Self {
            model_path: model_path.into(),
            confidence,
            anchors: generate_anchors(),
            session: OnceLock::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.session.get().is_some()
    }
}

#[async_trait::async_trait]
impl FaceDetector for OnnxFaceDetector {
    async fn load(&self) -> Result<(), DetectError> {
        if self.is_loaded() {
            return Ok(());
        }

        let path = self.model_path.clone();
        if !path.is_file() {
            return Err(DetectError::Load(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let session = tokio::task::spawn_blocking(move || {
            Session::builder()
                .map_err(|e| DetectError::Load(e.to_string()))?
                .commit_from_file(&path)
                .map_err(|e| DetectError::Load(e.to_string()))
        })
        .await
        .map_err(|e| DetectError::Load(format!("loader task failed: {e}")))??;

        // A concurrent load may have won; either session is equivalent
        let _ = self.session.set(Mutex::new(session));
        tracing::info!("[DETECT] Loaded face model {}", self.model_path.display());
        Ok(())
    }

    fn detect(&self, frame: &RgbImage) -> Result<Vec<DetectionBox>, DetectError> {
        let session = self.session.get().ok_or(DetectError::NotLoaded)?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let input = ort::value::Tensor::from_array(preprocess(frame, INPUT_SIZE))
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let mut session = session
            .lock()
            .map_err(|_| DetectError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        // [1, 896, 16] regressors and [1, 896, 1] scores
        if outputs.len() < 2 {
            return Err(DetectError::Inference(format!(
                "expected 2 outputs, got {}",
                outputs.len()
            )));
        }
        let regressors = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let scores = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let regressors = regressors
            .as_slice()
            .ok_or_else(|| DetectError::Inference("regressors not contiguous".to_string()))?;
        let scores = scores
            .as_slice()
            .ok_or_else(|| DetectError::Inference("scores not contiguous".to_string()))?;

        let mut candidates = decode(
            &self.anchors,
            regressors,
            scores,
            self.confidence,
            width,
            height,
        );
        Ok(nms(&mut candidates, NMS_IOU_THRESH)
            .into_iter()
            .map(|c| c.bbox)
            .collect())
    }

    fn name(&self) -> &str {
        "blazeface"
    }
}

/// Nearest-neighbour resize to `size` x `size`, scaled to [0,1], NCHW
fn preprocess(frame: &RgbImage, size: u32) -> Array4<f32> {
    let (src_w, src_h) = frame.dimensions();
    let s = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as u32).min(src_h - 1);
        for x in 0..size {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / size as f64) as u32).min(src_w - 1);
            let pixel = frame.get_pixel(src_x, src_y);
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }
    }

    tensor
}

fn generate_anchors() -> Vec<[f32; 2]> {
    // (stride, anchors per cell)
    let layers = [(8, 2), (16, 6)];
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for (stride, per_cell) in layers {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat_n([cx, cy], per_cell));
            }
        }
    }

    anchors
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    bbox: DetectionBox,
    score: f32,
}

/// Anchor-relative regressions to frame-space boxes above `confidence`
fn decode(
    anchors: &[[f32; 2]],
    regressors: &[f32],
    scores: &[f32],
    confidence: f32,
    width: u32,
    height: u32,
) -> Vec<Candidate> {
    let (fw, fh) = (width as f32, height as f32);
    let scale = INPUT_SIZE as f32;

    anchors
        .iter()
        .zip(scores)
        .enumerate()
        .filter_map(|(i, (anchor, &raw))| {
            let score = sigmoid(raw);
            if score < confidence {
                return None;
            }
            let r = regressors.get(i * REGRESSOR_STRIDE..i * REGRESSOR_STRIDE + 4)?;

            let cx = anchor[0] + r[0] / scale;
            let cy = anchor[1] + r[1] / scale;
            let (w, h) = (r[2] / scale, r[3] / scale);

            let x1 = ((cx - w / 2.0) * fw).max(0.0);
            let y1 = ((cy - h / 2.0) * fh).max(0.0);
            let x2 = ((cx + w / 2.0) * fw).min(fw);
            let y2 = ((cy + h / 2.0) * fh).min(fh);
            if x2 <= x1 || y2 <= y1 {
                return None;
            }

            Some(Candidate {
                bbox: DetectionBox {
                    x: x1,
                    y: y1,
                    width: x2 - x1,
                    height: y2 - y1,
                },
                score,
            })
        })
        .collect()
}

fn nms(candidates: &mut [Candidate], iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates.iter() {
        if keep.iter().all(|k| iou(&k.bbox, &candidate.bbox) <= iou_thresh) {
            keep.push(candidate.clone());
        }
    }
    keep
}

fn iou(a: &DetectionBox, b: &DetectionBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    inter / (a.width * a.height + b.width * b.height - inter)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
