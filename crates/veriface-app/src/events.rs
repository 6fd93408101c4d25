use std::path::PathBuf;

use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;
use veriface_types::{AppEvent, TriggerMode};

use crate::capture_context::CaptureContext;

pub mod auto_trigger;
pub mod capture_and_send;

use capture_and_send::prepare;

/// App's main loop. Returns when the operator quits or on shutdown.
pub async fn event_loop(
    ctx: CaptureContext,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let _ = ctx.event_tx.send(AppEvent::BackendReady).await;

    tracing::info!("[EVENT_LOOP] Starting main loop, waiting for events");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = ui_to_app_rx.recv() => event?,
        };

        tracing::debug!(
            "[EVENT_LOOP] Event received: {:?}",
            std::mem::discriminant(&event)
        );
        if !handle_events(&ctx, event).await? {
            break;
        }
    }

    tracing::info!("[EVENT_LOOP] Stopped");
    Ok(())
}

/// Returns false when the session should end
async fn handle_events(ctx: &CaptureContext, event: AppEvent) -> anyhow::Result<bool> {
    let state = &ctx.state;

    match event {
        AppEvent::SetServerUrl(url) => {
            if state.settings.set_server_url(&url) {
                let current = state.settings.server_url();
                let status = if current.is_empty() {
                    "Server cleared, verification off".to_string()
                } else {
                    format!("Server set to {current}")
                };
                tracing::info!("{status}");
                status_update(ctx, status).await;
            }
        }
        AppEvent::SetAutoSend(enabled) => {
            if state.settings.set_auto_send(enabled) {
                let status = if enabled {
                    "Auto-Capture ON"
                } else {
                    "Auto-Capture OFF"
                };
                tracing::info!("{status}");
                status_update(ctx, status.to_string()).await;
            }
        }
        AppEvent::TriggerCapture(mode) => {
            // Pending insert happens here so the next event sees the loading flag
            if let Some(attempt) = prepare(ctx, mode).await {
                tokio::spawn(attempt.run());
            }
        }
        AppEvent::RequestResults => {
            for mode in [TriggerMode::Auto, TriggerMode::Manual] {
                let results = state.stores.snapshot(mode).await;
                ctx.event_tx
                    .send(AppEvent::ShowResults { mode, results })
                    .await?;
            }
        }
        AppEvent::SaveOverlay(path) => {
            let status = save_overlay(ctx, path).await;
            status_update(ctx, status).await;
        }
        AppEvent::Quit => {
            tracing::info!("Quit requested");
            return Ok(false);
        }
        AppEvent::ShowResults { .. }
        | AppEvent::LoadingChanged(_)
        | AppEvent::StatusUpdate(_)
        | AppEvent::BackendReady => {
            // UI-only events, ignore in backend
        }
    }

    Ok(true)
}

async fn save_overlay(ctx: &CaptureContext, path: PathBuf) -> String {
    let overlay = ctx.state.latest_overlay();
    let boxes = overlay.boxes.len();
    let target = path.clone();

    match tokio::task::spawn_blocking(move || overlay.save_png(&target)).await {
        Ok(Ok(())) => format!("Overlay with {boxes} boxes saved to {}", path.display()),
        Ok(Err(e)) => {
            tracing::warn!("Failed to save overlay: {e}");
            format!("Failed to save overlay: {e}")
        }
        Err(e) => {
            tracing::error!("Overlay task error: {e}");
            "Failed to save overlay".to_string()
        }
    }
}

async fn status_update(ctx: &CaptureContext, status: String) {
    let _ = ctx.event_tx.send(AppEvent::StatusUpdate(status)).await;
}
