use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use veriface_vision::{FaceDetector, Overlay};

use crate::state::AppState;

/// Periodic face detection for the live overlay. No network I/O.
///
/// Cancellation is only observed between cycles.
pub async fn detection_loop(
    state: Arc<AppState>,
    detector: Arc<dyn FaceDetector>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let period = Duration::from_millis(state.config.capture.detection_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        "[DETECT] Overlay loop started ({}, every {}ms)",
        detector.name(),
        period.as_millis()
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                run_detection_cycle(&state, &detector).await;
            }
        }
    }

    tracing::info!("[DETECT] Overlay loop stopped");
    Ok(())
}

/// One cycle: detect on the current frame and replace the overlay.
///
/// Returns the number of boxes drawn, or `None` if the cycle was skipped
/// (feed not ready, detector failure).
pub async fn run_detection_cycle(state: &AppState, detector: &Arc<dyn FaceDetector>) -> Option<usize> {
    let frame = state.feed.current_frame()?;
    let (width, height) = frame.dimensions();

    let detector = detector.clone();
    let result = tokio::task::spawn_blocking(move || detector.detect(&frame)).await;

    match result {
        Ok(Ok(boxes)) => {
            let count = boxes.len();
            state.overlay.send_replace(Overlay::new(width, height, boxes));
            Some(count)
        }
        Ok(Err(e)) => {
            tracing::warn!("[DETECT] Detection failed, skipping cycle: {e}");
            None
        }
        Err(e) => {
            tracing::error!("[DETECT] Detection task error: {e}");
            None
        }
    }
}
