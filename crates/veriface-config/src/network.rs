use std::env;

use serde::{Deserialize, Serialize};

fn default_verify_path() -> String {
    "/verify".to_string()
}

/// Remote verification endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL the session starts with, empty means verification is off
    pub server_url: String,
    /// Path appended to the base URL for each request
    #[serde(default = "default_verify_path")]
    pub verify_path: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            verify_path: default_verify_path(),
        }
    }
}

impl NetworkConfig {
    pub fn new() -> Self {
        let server_url = env::var("VERIFACE_SERVER_URL").unwrap_or_default();
        let verify_path = env::var("VERIFY_PATH").unwrap_or_else(|_| default_verify_path());

        Self {
            server_url,
            verify_path,
        }
    }
}
