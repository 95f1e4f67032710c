use thiserror::Error;

/// Errors that abort a notification run
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to send request to teams webhook")]
    Delivery(#[source] reqwest::Error),

    #[error("Teams webhook rejected the card: {status} - {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to serialize card")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while fetching step logs from the CI server.
///
/// These never leave the card builder; a failed fetch only drops the log facts.
#[derive(Debug, Error)]
pub enum LogFetchError {
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server error {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, NotifyError>;
