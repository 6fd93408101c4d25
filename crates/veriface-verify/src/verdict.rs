use serde_json::Value;
use veriface_types::{ResultRecord, ResultStatus};

use crate::messages::{SUCCESS_MESSAGE, error_message};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Server answered with a non-2xx status
    #[error("Server error: {message}")]
    Server { status: u16, message: String },

    #[error("No response from the server. Please check the backend.")]
    NoResponse(#[source] reqwest::Error),

    #[error("Error during request setup: {0}")]
    Setup(String),
}

impl VerifyError {
    /// Short technical description kept as the record's `data`
    pub fn description(&self) -> String {
        match self {
            VerifyError::Server { status, .. } => {
                format!("Request failed with status code {status}")
            }
            VerifyError::NoResponse(e) => e.to_string(),
            VerifyError::Setup(description) => description.clone(),
        }
    }
}

/// Classified outcome of one verification attempt
#[derive(Debug)]
pub enum Verdict {
    Verified { payload: Value },
    Rejected { code: Option<String> },
    Failed(VerifyError),
}

pub fn classify(result: Result<Value, VerifyError>) -> Verdict {
    match result {
        Ok(payload) => {
            let is_real = payload.get("is_real").is_some_and(truthy);

            if is_real {
                Verdict::Verified { payload }
            } else {
                let code = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Verdict::Rejected { code }
            }
        }
        Err(e) => Verdict::Failed(e),
    }
}

/// Truthiness of the `is_real` flag: `1` and `"yes"` count,
/// `0`, `""` and `null` do not
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Verdict {
    pub fn status(&self) -> ResultStatus {
        match self {
            Verdict::Verified { .. } => ResultStatus::Done,
            Verdict::Rejected { .. } | Verdict::Failed(_) => ResultStatus::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Verdict::Verified { .. } => SUCCESS_MESSAGE.to_string(),
            Verdict::Rejected { code } => error_message(code.as_deref()).to_string(),
            Verdict::Failed(e) => e.to_string(),
        }
    }

    /// Final state of `pending`, same id and timestamp
    pub fn into_record(self, pending: &ResultRecord) -> ResultRecord {
        let status = self.status();
        let message = self.message();
        let data = match self {
            Verdict::Verified { payload } => payload,
            Verdict::Rejected { code } => code.map(Value::String).unwrap_or(Value::Null),
            Verdict::Failed(e) => Value::String(e.description()),
        };
        pending.resolve(status, data, &message)
    }
}
