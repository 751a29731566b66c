use shared::validation::ValidationError;
use thiserror::Error;

/// Every way a store operation can fail. The `Display` text is what the
/// store records as its error message and broadcasts to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl StoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Local validation failures never reach the network.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport("request timed out".to_string());
        }
        if err.is_decode() {
            return Self::Transport(format!("invalid response body: {err}"));
        }
        Self::Transport(err.to_string())
    }
}
