use serde::Serialize;
use serde_json::Value;

use crate::Verifier;
use crate::verdict::VerifyError;

#[derive(Clone)]
pub struct HttpVerifier {
    verify_path: String,
    client: reqwest::Client,
}

impl HttpVerifier {
    pub fn new(verify_path: impl Into<String>) -> Self {
        Self {
            verify_path: verify_path.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(verify_path: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            verify_path: verify_path.into(),
            client,
        }
    }

    pub fn endpoint(&self, server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), self.verify_path)
    }
}

impl Default for HttpVerifier {
    fn default() -> Self {
        Self::new("/verify")
    }
}

#[async_trait::async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, server_url: &str, image_base64: &str) -> Result<Value, VerifyError> {
        let url = self.endpoint(server_url);

        let request = self
            .client
            .post(&url)
            .json(&VerifyRequest {
                image: image_base64,
            })
            .build()
            .map_err(|e| VerifyError::Setup(e.to_string()))?;

        tracing::debug!("[VERIFY] POST {url} ({} bytes of base64)", image_base64.len());

        let response = self.client.execute(request).await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        let payload = parse_body(&body);

        if status.is_success() {
            return Ok(payload);
        }

        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string()
            });

        Err(VerifyError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    image: &'a str,
}

/// Non-JSON bodies are kept as a string payload
fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn transport_error(e: reqwest::Error) -> VerifyError {
    if e.is_builder() {
        VerifyError::Setup(e.to_string())
    } else {
        VerifyError::NoResponse(e)
    }
}
