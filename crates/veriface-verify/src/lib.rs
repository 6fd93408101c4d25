mod client;
mod messages;
mod verdict;

pub use client::HttpVerifier;
pub use messages::{SUCCESS_MESSAGE, UNKNOWN_ERROR_MESSAGE, error_message};
pub use verdict::{Verdict, VerifyError, classify};

/// Remote face verification service
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    /// Send one base64 JPEG to `server_url` and return the response body.
    ///
    /// A 2xx response is `Ok` whatever its payload says; classification
    /// into verified/rejected happens in [`classify`].
    async fn verify(
        &self,
        server_url: &str,
        image_base64: &str,
    ) -> Result<serde_json::Value, VerifyError>;
}
