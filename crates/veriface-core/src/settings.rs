use tokio::sync::watch;
use veriface_config::Config;

/// Operator-controlled values for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub auto_send: bool,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server_url: config.network.server_url.trim().to_string(),
            auto_send: config.auto_send,
        }
    }

    /// Verification (manual or auto) is inert without an endpoint
    pub fn has_endpoint(&self) -> bool {
        !self.server_url.is_empty()
    }

    pub fn auto_send_active(&self) -> bool {
        self.auto_send && self.has_endpoint()
    }
}

/// Session-scoped settings shared by reference with the pipeline and scheduler.
///
/// Backed by a watch channel so the scheduler restarts whenever a value
/// actually changes. Writes that leave the value untouched do not notify.
pub struct SessionSettings {
    tx: watch::Sender<Settings>,
}

impl SessionSettings {
    pub fn new(initial: Settings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Settings {
        self.tx.borrow().clone()
    }

    pub fn server_url(&self) -> String {
        self.tx.borrow().server_url.clone()
    }

    pub fn auto_send(&self) -> bool {
        self.tx.borrow().auto_send
    }

    /// Returns true if the value changed
    pub fn set_server_url(&self, url: &str) -> bool {
        let url = url.trim();
        self.tx.send_if_modified(|s| {
            if s.server_url == url {
                return false;
            }
            s.server_url = url.to_string();
            true
        })
    }

    /// Returns true if the value changed
    pub fn set_auto_send(&self, enabled: bool) -> bool {
        self.tx.send_if_modified(|s| {
            if s.auto_send == enabled {
                return false;
            }
            s.auto_send = enabled;
            true
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
