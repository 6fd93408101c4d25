use veriface_types::{AppEvent, ResultRecord, TriggerMode};
use veriface_verify::{Verdict, VerifyError, classify};
use veriface_vision::{Frame, encode_jpeg_base64};

use crate::capture_context::CaptureContext;

/// A started capture attempt: snapshot taken, pending record published.
///
/// Resolving it with [`Attempt::run`] always writes the final record, whatever
/// the outcome of the request.
pub struct Attempt {
    ctx: CaptureContext,
    mode: TriggerMode,
    pending: ResultRecord,
    frame: Frame,
    server_url: String,
    loading: Option<LoadingGuard>,
}

/// Guards, snapshot and pending insert. Returns `None` for silent no-ops:
/// no endpoint, feed not ready, or a manual request already in flight.
pub async fn prepare(ctx: &CaptureContext, mode: TriggerMode) -> Option<Attempt> {
    let state = &ctx.state;

    let server_url = state.settings.server_url();
    if server_url.is_empty() {
        tracing::debug!("[CAPTURE] {mode} trigger ignored, no server configured");
        return None;
    }

    if mode == TriggerMode::Manual && state.is_loading() {
        tracing::debug!("[CAPTURE] Manual trigger ignored, request in flight");
        return None;
    }

    let Some(frame) = state.feed.current_frame() else {
        tracing::debug!("[CAPTURE] {mode} trigger ignored, video feed not ready");
        return None;
    };

    let pending = ResultRecord::pending(local_timestamp());
    tracing::info!("[CAPTURE] {mode} attempt {} started", pending.id);
    publish(ctx, mode, pending.clone()).await;

    let loading = (mode == TriggerMode::Manual).then(|| LoadingGuard::engage(ctx));

    Some(Attempt {
        ctx: ctx.clone(),
        mode,
        pending,
        frame,
        server_url,
        loading,
    })
}

/// Full trigger: prepare, send, classify, update in place
pub async fn capture_and_send(ctx: &CaptureContext, mode: TriggerMode) -> Option<ResultRecord> {
    let attempt = prepare(ctx, mode).await?;
    Some(attempt.run().await)
}

impl Attempt {
    pub fn pending(&self) -> &ResultRecord {
        &self.pending
    }

    pub async fn run(self) -> ResultRecord {
        let Attempt {
            ctx,
            mode,
            pending,
            frame,
            server_url,
            loading,
        } = self;

        let quality = ctx.state.config.capture.jpeg_quality;
        let encoded =
            tokio::task::spawn_blocking(move || encode_jpeg_base64(&frame, quality)).await;

        let result = match encoded {
            Ok(Ok(encoded)) => ctx.verifier.verify(&server_url, &encoded.base64).await,
            Ok(Err(e)) => Err(VerifyError::Setup(e.to_string())),
            Err(e) => Err(VerifyError::Setup(format!("encoder task failed: {e}"))),
        };

        let verdict = classify(result);
        match &verdict {
            Verdict::Verified { .. } => {
                tracing::info!("[CAPTURE] {mode} attempt {} verified", pending.id);
            }
            Verdict::Rejected { code } => {
                tracing::info!("[CAPTURE] {mode} attempt {} rejected: {code:?}", pending.id);
            }
            Verdict::Failed(e) => {
                tracing::warn!("[CAPTURE] {mode} attempt {} failed: {e}", pending.id);
            }
        }

        let record = verdict.into_record(&pending);
        publish(&ctx, mode, record.clone()).await;
        // Cleared only once the final record is visible
        drop(loading);
        record
    }
}

async fn publish(ctx: &CaptureContext, mode: TriggerMode, record: ResultRecord) {
    let results = ctx.state.stores.add_result(mode, record).await;
    let _ = ctx
        .event_tx
        .send(AppEvent::ShowResults { mode, results })
        .await;
}

fn local_timestamp() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

/// Holds the manual loading flag; clears it on drop on every path out of a request.
pub struct LoadingGuard {
    ctx: CaptureContext,
}

impl LoadingGuard {
    fn engage(ctx: &CaptureContext) -> Self {
        ctx.state.set_loading(true);
        notify_loading(ctx, true);
        Self { ctx: ctx.clone() }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.ctx.state.set_loading(false);
        notify_loading(&self.ctx, false);
    }
}

/// Best effort: the flag itself is authoritative, the event only drives the console
fn notify_loading(ctx: &CaptureContext, loading: bool) {
    match ctx.event_tx.try_send(AppEvent::LoadingChanged(loading)) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!("[CAPTURE] UI channel full, LoadingChanged({loading}) dropped");
        }
        Err(e) => {
            tracing::debug!("[CAPTURE] LoadingChanged({loading}) not delivered: {e}");
        }
    }
}
