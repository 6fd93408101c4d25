use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use veriface_config::Config;
use veriface_core::{ResultStores, SessionSettings, Settings};
use veriface_vision::{Overlay, VideoFeed};

/// Everything one operator session owns. Created at startup, dropped at exit.
pub struct AppState {
    pub config: Config,
    pub settings: SessionSettings,
    pub stores: ResultStores,
    pub feed: Arc<dyn VideoFeed>,
    pub overlay: watch::Sender<Overlay>,
    manual_loading: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, feed: Arc<dyn VideoFeed>) -> Self {
        let settings = SessionSettings::new(Settings::from_config(&config));
        let (overlay, _) = watch::channel(Overlay::default());

        Self {
            config,
            settings,
            stores: ResultStores::new(),
            feed,
            overlay,
            manual_loading: AtomicBool::new(false),
        }
    }

    /// True while a manual request is in flight
    pub fn is_loading(&self) -> bool {
        self.manual_loading.load(Ordering::SeqCst)
    }

    /// Returns the previous value
    pub(crate) fn set_loading(&self, loading: bool) -> bool {
        self.manual_loading.swap(loading, Ordering::SeqCst)
    }

    pub fn latest_overlay(&self) -> Overlay {
        self.overlay.borrow().clone()
    }
}
