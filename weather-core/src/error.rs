//! Error taxonomy for the lookup pipeline.
//!
//! The `Display` text of every variant is the message shown to the operator.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single provider request. No request is ever retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Unable to reach the weather service. Check your internet connection.")]
    ConnectionUnavailable,

    #[error("The weather service did not respond in time.")]
    Timeout,

    #[error("City not found.")]
    NotFound,

    #[error("The API key was rejected. Check your credentials.")]
    Unauthorized,

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    #[error("The weather service returned an error (HTTP {0}).")]
    ProviderError(u16),

    #[error("Unexpected error while contacting the weather service: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Map a response status to the taxonomy. `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }

        Some(match status.as_u16() {
            404 => Self::NotFound,
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            code => Self::ProviderError(code),
        })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // A connect attempt that runs out the clock reports both flags.
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ConnectionUnavailable
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("The weather service returned an unexpected response: {0}")]
    MalformedPayload(String),
}

/// Failure of one persistence sink. Never fatal; reported per sink.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Log file error: {0}")]
    File(#[from] std::io::Error),
}

/// Everything a single lookup can fail with before anything is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Please enter a city name.")]
    EmptyCity,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}
