use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use veriface_types::TriggerMode;

use super::capture_and_send::prepare;
use crate::capture_context::CaptureContext;

/// Keeps one periodic auto-capture task alive while auto-send is on and an
/// endpoint is set.
///
/// Every settings change cancels the running task before a fresh one is
/// started, so the first firing is always one full period after the change.
/// Attempts already started are detached from the task and run to completion.
pub async fn auto_trigger_loop(ctx: CaptureContext, cancel: CancellationToken) -> anyhow::Result<()> {
    let period = Duration::from_millis(ctx.state.config.auto_send_interval_ms.max(1));
    let mut settings_rx = ctx.state.settings.subscribe();
    let mut current: Option<CancellationToken> = None;

    loop {
        if let Some(token) = current.take() {
            token.cancel();
        }

        let settings = settings_rx.borrow_and_update().clone();
        if settings.auto_send_active() {
            let token = cancel.child_token();
            spawn_periodic(ctx.clone(), period, token.clone());
            current = Some(token);
            tracing::info!(
                "[AUTO] Sending every {}ms to {}",
                period.as_millis(),
                settings.server_url
            );
        } else {
            tracing::info!(
                "[AUTO] Idle (auto_send: {}, endpoint set: {})",
                settings.auto_send,
                settings.has_endpoint()
            );
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(token) = current {
        token.cancel();
    }
    tracing::info!("[AUTO] Scheduler stopped");
    Ok(())
}

fn spawn_periodic(ctx: CaptureContext, period: Duration, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    // The watcher may not have seen a change made since the last tick
                    if !ctx.state.settings.current().auto_send_active() {
                        continue;
                    }

                    // Overlapping attempts are allowed, each owns its own record
                    if let Some(attempt) = prepare(&ctx, TriggerMode::Auto).await {
                        tokio::spawn(attempt.run());
                    }
                }
            }
        }
    })
}
