use std::sync::Arc;

use image::RgbImage;
use tokio::sync::watch;

/// A decoded video frame at the source's native resolution
pub type Frame = Arc<RgbImage>;

/// Read-only view of a live video source.
///
/// Both the overlay loop and the capture step read from it; neither mutates it.
pub trait VideoFeed: Send + Sync {
    /// Latest frame, or `None` while the source is not ready
    fn current_frame(&self) -> Option<Frame>;

    fn is_ready(&self) -> bool {
        self.current_frame().is_some()
    }
}

/// Latest-frame slot a camera driver (or [`crate::ReplaySource`]) publishes into.
pub struct LiveFeed {
    tx: watch::Sender<Option<Frame>>,
}

impl LiveFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(Some(frame));
    }

    /// Drop the current frame, e.g. when the camera is released
    pub fn detach(&self) {
        self.tx.send_replace(None);
    }

    /// Wait until the first frame arrives
    pub async fn wait_ready(&self) {
        let mut rx = self.tx.subscribe();
        // Sender is owned by self, so the channel cannot close while we wait
        let _ = rx.wait_for(|f| f.as_ref().is_some_and(|f| has_pixels(f))).await;
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoFeed for LiveFeed {
    fn current_frame(&self) -> Option<Frame> {
        self.tx
            .borrow()
            .as_ref()
            .filter(|f| has_pixels(f))
            .cloned()
    }
}

fn has_pixels(frame: &RgbImage) -> bool {
    frame.width() > 0 && frame.height() > 0
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_not_ready_until_published() {
        let feed = LiveFeed::new();
        assert!(!feed.is_ready());

        feed.publish(Arc::new(RgbImage::new(4, 3)));
        let frame = feed.current_frame().unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
    }

    #[test]
    fn test_zero_sized_frame_is_not_ready() {
        let feed = LiveFeed::new();
        feed.publish(Arc::new(RgbImage::new(0, 0)));
        assert!(feed.current_frame().is_none());
    }

    #[test]
    fn test_detach_clears_frame() {
        let feed = LiveFeed::new();
        feed.publish(Arc::new(RgbImage::new(2, 2)));
        feed.detach();
        assert!(!feed.is_ready());
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_on_publish() {
        let feed = Arc::new(LiveFeed::new());
        let waiter = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.wait_ready().await })
        };

        feed.publish(Arc::new(RgbImage::new(8, 8)));
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
