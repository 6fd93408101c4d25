use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};
use kanal::AsyncReceiver;
use serde_json::Value;
use tokio::sync::Semaphore;
use veriface_config::Config;
use veriface_types::AppEvent;
use veriface_verify::{Verifier, VerifyError};
use veriface_vision::LiveFeed;

use crate::capture_context::CaptureContext;
use crate::state::AppState;

type Responder = Box<dyn Fn() -> Result<Value, VerifyError> + Send + Sync>;

/// Verifier with a fixed answer. With a gate, each call waits for a permit.
pub struct ScriptedVerifier {
    respond: Responder,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn ok(payload: Value) -> Self {
        Self::with(move || Ok(payload.clone()))
    }

    pub fn with(respond: impl Fn() -> Result<Value, VerifyError> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Calls block until permits are added to the returned semaphore
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Verifier for ScriptedVerifier {
    async fn verify(&self, _server_url: &str, image_base64: &str) -> Result<Value, VerifyError> {
        assert!(!image_base64.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        (self.respond)()
    }
}

pub struct Harness {
    pub ctx: CaptureContext,
    pub feed: Arc<LiveFeed>,
    pub events: AsyncReceiver<AppEvent>,
}

pub fn test_frame() -> RgbImage {
    RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8 * 3, y as u8 * 5, 90]))
}

/// Session with a ready feed and the given endpoint
pub fn harness(verifier: Arc<dyn Verifier>, server_url: &str) -> Harness {
    let mut config = Config::default();
    config.network.server_url = server_url.to_string();

    let feed = Arc::new(LiveFeed::new());
    feed.publish(Arc::new(test_frame()));

    let state = Arc::new(AppState::new(config, feed.clone()));
    let (event_tx, events) = kanal::bounded_async(1024);

    Harness {
        ctx: CaptureContext::new(state, verifier, event_tx),
        feed,
        events,
    }
}
