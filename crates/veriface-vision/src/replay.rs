use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureError;
use crate::feed::{Frame, LiveFeed};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Image files played back as a looping video source.
///
/// Stands in for a camera driver: frames are published into a [`LiveFeed`]
/// at a fixed rate until cancelled.
pub struct ReplaySource {
    frames: Vec<Frame>,
}

impl ReplaySource {
    /// Load a single image, or every image in a directory sorted by name
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let mut frames = Vec::with_capacity(paths.len());
        for p in &paths {
            let image = image::open(p)?.to_rgb8();
            tracing::debug!("[REPLAY] Loaded {} ({}x{})", p.display(), image.width(), image.height());
            frames.push(Arc::new(image));
        }

        if frames.is_empty() {
            return Err(CaptureError::NoFrames(path.display().to_string()));
        }

        Ok(Self { frames })
    }

    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, CaptureError> {
        if frames.is_empty() {
            return Err(CaptureError::NoFrames("<memory>".to_string()));
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn spawn(self, feed: Arc<LiveFeed>, fps: u32, cancel: CancellationToken) -> JoinHandle<()> {
        let period = Duration::from_millis(1000 / u64::from(fps.max(1)));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut frames = self.frames.iter().cycle();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Some(frame) = frames.next() {
                            feed.publish(frame.clone());
                        }
                    }
                }
            }

            feed.detach();
            tracing::info!("[REPLAY] Stopped");
        })
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
