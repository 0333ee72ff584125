use thiserror::Error;

pub const NETWORK_UNAVAILABLE_MESSAGE: &str =
    "Unable to connect to server. Please check if the backend is running.";

/// Failure of a single sync call. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),
    /// No response reached the client.
    #[error("{}", NETWORK_UNAVAILABLE_MESSAGE)]
    NetworkUnavailable { cause: String },
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn network(err: &reqwest::Error) -> Self {
        Self::NetworkUnavailable {
            cause: err.to_string(),
        }
    }

    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => *status,
            _ => None,
        }
    }
}
