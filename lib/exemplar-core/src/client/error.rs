use std::time::Duration;

use crate::capture::CapturedResponse;

/// Errors returned when awaiting a request builder.
///
/// Whatever the variant, the request was captured before the error surfaced; variants carrying
/// a response were also captured with that response.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ClientError {
    /// Transport failure of the reqwest-based adapters, no response was received.
    Reqwest(reqwest::Error),

    /// The request URL cannot be parsed.
    Url(url::ParseError),

    /// The request cannot be built.
    Http(http::Error),

    /// Invalid header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// The body cannot be serialized to JSON.
    Json(serde_json::Error),

    /// A file attachment cannot be read.
    Io(std::io::Error),

    /// The in-process response body cannot be read.
    Body(axum::Error),

    /// No response within the request timeout.
    #[display("Request timed out after {duration:?}")]
    #[from(skip)]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// The transport treats the response status as a failure.
    ///
    /// The response is captured and available here.
    #[display("Server responded with status {}: {}", response.status, response.body)]
    #[from(skip)]
    Status {
        /// The captured response.
        response: Box<CapturedResponse>,
    },

    /// The status differs from the one set with `expect_status`.
    #[display("Expected status {expected}, got {actual}: {body}")]
    #[from(skip)]
    UnexpectedStatus {
        /// The expected status.
        expected: u16,
        /// The received status.
        actual: u16,
        /// The received body.
        body: String,
    },

    /// A header differs from the one set with `expect_header`.
    #[display("Expected header '{name}' to be '{expected}', got {actual:?}")]
    #[from(skip)]
    UnexpectedHeader {
        /// The header name.
        name: String,
        /// The expected value.
        expected: String,
        /// The received value, if any.
        actual: Option<String>,
    },

    /// The base URL of an adapter is invalid.
    #[display("Invalid base URL: {error}")]
    #[from(skip)]
    InvalidBaseUrl {
        /// Why the base URL was rejected.
        error: String,
    },
}

impl ClientError {
    /// The captured response carried by the error, if the call got one.
    pub fn response(&self) -> Option<&CapturedResponse> {
        match self {
            Self::Status { response } => Some(response),
            _ => None,
        }
    }
}
