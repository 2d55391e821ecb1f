use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    Network,
    RequestFailed,
    MalformedResponse,
    InvalidEndpoint,
}

#[derive(Debug, Error)]
pub enum ChatClientError {
    /// The request never produced a response: connect failure, timeout, or a body that could not be read.
    #[error("network failure: {message}")]
    NetworkFailure {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("{message}")]
    RequestFailed { status: u16, message: String },
    #[error("malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid API endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl ChatClientError {
    pub fn kind(&self) -> ChatErrorKind {
        match self {
            Self::NetworkFailure { .. } => ChatErrorKind::Network,
            Self::RequestFailed { .. } => ChatErrorKind::RequestFailed,
            Self::MalformedResponse { .. } => ChatErrorKind::MalformedResponse,
            Self::InvalidEndpoint(_) => ChatErrorKind::InvalidEndpoint,
        }
    }

    pub(crate) fn network(source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            format!("request timed out: {source}")
        } else if source.is_connect() {
            format!("failed to connect: {source}")
        } else {
            source.to_string()
        };
        Self::NetworkFailure {
            message,
            source: Some(source),
        }
    }
}
