pub use reqwest::StatusCode;
use thiserror::Error;

use super::sse::SseError;

/// A request could not complete or the service did not answer with success
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid service url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {endpoint} could not complete")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },
    #[error("could not decode the response of {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The push channel could not be opened or failed while open
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("could not open the push channel")]
    Connect(#[from] NetworkError),
    #[error("push channel transport failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("push channel sent an undecodable event stream")]
    Decode(#[from] SseError),
}
