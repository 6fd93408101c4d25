use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use veriface_types::AppEvent;
use veriface_verify::Verifier;
use veriface_vision::FaceDetector;

use crate::capture_context::CaptureContext;
use crate::detection::detection_loop;
use crate::events::auto_trigger::auto_trigger_loop;
use crate::events::event_loop;
use crate::state::AppState;
use crate::ui::ui_loop;

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256), // result updates, two per attempt
            ui_to_app: kanal::bounded_async(64),  // operator commands
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    verifier: Arc<dyn Verifier>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            channels: ChannelSet::new(),
            state,
            verifier,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn capture_context(&self) -> CaptureContext {
        CaptureContext::new(
            self.state.clone(),
            self.verifier.clone(),
            self.channels.app_to_ui.0.clone(),
        )
    }

    /// Token for tasks spawned outside the controller (e.g. the video source)
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    pub fn spawn_tasks(&self, detector: Arc<dyn FaceDetector>) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();
        let ctx = self.capture_context();

        // Event loop
        tasks.spawn(event_loop(
            ctx.clone(),
            self.channels.ui_to_app.1.clone(),
            self.cancel_token.child_token(),
        ));

        // Operator console
        tasks.spawn(ui_loop(
            self.channels.app_to_ui.1.clone(),
            self.channels.ui_to_app.0.clone(),
            self.cancel_token.child_token(),
        ));

        // Overlay detection
        tasks.spawn(detection_loop(
            self.state.clone(),
            detector,
            self.cancel_token.child_token(),
        ));

        // Auto-trigger scheduler
        tasks.spawn(auto_trigger_loop(ctx, self.cancel_token.child_token()));

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
