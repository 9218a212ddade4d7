use thiserror::Error;

/// Banner text used whenever the service gives no usable reason for a failure.
pub const GENERIC_FAILURE: &str = "Failed to connect";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("{label} must be a number")]
    InvalidNumber {
        key: String,
        label: String,
        value: String,
    },

    /// Non-success HTTP status. `detail` is already resolved to the banner text.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("{0}")]
    Transport(String),

    #[error("Invalid response from prediction service: {0}")]
    InvalidResponse(String),
}

impl SubmitError {
    /// Build a rejection from a non-success response body.
    ///
    /// Only a JSON object with a non-empty string `detail` is surfaced verbatim;
    /// any other body degrades to [`GENERIC_FAILURE`].
    pub fn rejected(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("detail")
                    .and_then(|d| d.as_str())
                    .map(str::to_string)
            })
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());

        SubmitError::Rejected { status, detail }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            SubmitError::Transport(GENERIC_FAILURE.to_string())
        } else {
            SubmitError::Transport(message)
        }
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;
