use serde::Deserialize;
use thiserror::Error;

/// Failure reported by, or while talking to, the Growatt Open API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error during {operation} (code {code}: {message})")]
    Response { operation: String, code: i64, message: String },

    #[error("failed to call `{path}`")]
    Transport {
        path: String,

        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to deserialize `{path}` response")]
    Decode {
        path: String,

        #[source]
        source: serde_json::Error,
    },

    #[error("invalid parameter: {0}")]
    Parameter(String),
}

/// Generic Open API V1 envelope.
///
/// The `data` is kept raw until the error code is checked, so that failed calls
/// with an unexpected payload shape still report the Growatt error.
#[derive(Deserialize)]
pub struct Response {
    /// Zero on success. A missing code is treated as a failure.
    #[serde(default = "Response::missing_error_code")]
    error_code: i64,

    #[serde(default)]
    error_msg: Option<String>,

    #[serde(default)]
    data: serde_json::Value,
}

impl Response {
    const fn missing_error_code() -> i64 {
        1
    }

    pub fn into_data(self, operation: &str) -> Result<serde_json::Value, ApiError> {
        if self.error_code == 0 {
            Ok(self.data)
        } else {
            Err(ApiError::Response {
                operation: operation.to_owned(),
                code: self.error_code,
                message: self.error_msg.unwrap_or_else(|| "Unknown error".to_owned()),
            })
        }
    }
}
