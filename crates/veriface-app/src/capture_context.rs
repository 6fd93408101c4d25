use std::sync::Arc;

use kanal::AsyncSender;
use veriface_types::AppEvent;
use veriface_verify::Verifier;

use crate::state::AppState;

/// Dependencies shared by the manual trigger, the auto scheduler and the
/// tasks they spawn. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct CaptureContext {
    pub state: Arc<AppState>,
    pub verifier: Arc<dyn Verifier>,
    pub event_tx: AsyncSender<AppEvent>,
}

impl CaptureContext {
    pub fn new(
        state: Arc<AppState>,
        verifier: Arc<dyn Verifier>,
        event_tx: AsyncSender<AppEvent>,
    ) -> Self {
        Self {
            state,
            verifier,
            event_tx,
        }
    }
}
