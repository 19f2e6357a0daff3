use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("invalid API endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("API token expired at {0}")]
    TokenExpired(DateTime<Utc>),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response of {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum TaskDataError {
    #[error("process item {0} carries no task data")]
    NoData(String),

    #[error("task data has no field '{0}'")]
    MissingField(String),

    #[error("task data field '{key}' is not a number: {value}")]
    NotANumber { key: String, value: String },
}
