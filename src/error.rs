use std::{fmt, io, string::FromUtf8Error, time::Duration};

use hyper::{StatusCode, Uri};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid status code {0}: must be between 100 and 999")]
    InvalidStatusCode(u16),
    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),
    #[error("invalid value for header {name:?}: {value:?}")]
    InvalidHeaderValue { name: String, value: String },
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("encode JSON body: {0}")]
    EncodeJson(serde_json::Error),

    #[error("request path {actual:?} does not match patched path {expected:?}")]
    PathMismatch { actual: String, expected: String },
    #[error("expected {expected} call(s) to {path:?}, observed {actual}")]
    CallCount {
        path: String,
        expected: u64,
        actual: u64,
    },
    #[error("no request to {path:?} has been recorded")]
    NotCalled { path: String },
    #[error("header {name:?} is missing from the last request to {path:?}")]
    HeaderMissing { path: String, name: String },
    #[error("header {name:?} of the last request to {path:?} is {actual:?}, expected {expected:?}")]
    HeaderMismatch {
        path: String,
        name: String,
        expected: String,
        actual: String,
    },

    #[error("request to patched path {path:?} dispatched before a response was bound")]
    NoResponseBound { path: String },

    #[error("no transport mounted for URL {0}")]
    NoTransport(String),
    #[error("unsupported URL scheme {0:?}, only plain http is supported")]
    UnsupportedScheme(String),
    #[error("connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("build request: {0}")]
    BuildRequest(hyper::http::Error),
    #[error("HTTP exchange: {0}")]
    Http(hyper::Error),
    #[error("request did not complete within {0:?}")]
    Timeout(Duration),

    #[error(
        "{} {class}: {} for url: {url}",
        .status.as_u16(),
        .status.canonical_reason().unwrap_or("Unknown")
    )]
    Status {
        status: StatusCode,
        class: StatusClass,
        url: Uri,
    },

    #[error("response body is not valid UTF-8: {0}")]
    DecodeText(FromUtf8Error),
    #[error("decode JSON body: {0}")]
    DecodeJson(serde_json::Error),
}

/// Broad classification of an [Error], used by tests to check what went wrong
/// without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value of the wrong shape was supplied at construction or assignment.
    Type,
    /// An expectation about observed requests did not hold.
    Assertion,
    /// A patched transport was used before a response was bound to it.
    Unbound,
    /// The request could not be delivered.
    Transport,
    /// The response carried a 4xx or 5xx status.
    Status,
    /// The response body could not be decoded.
    Decode,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidStatusCode(_)
            | Error::InvalidHeaderName(_)
            | Error::InvalidHeaderValue { .. }
            | Error::InvalidUrl { .. }
            | Error::EncodeJson(_) => ErrorKind::Type,
            Error::PathMismatch { .. }
            | Error::CallCount { .. }
            | Error::NotCalled { .. }
            | Error::HeaderMissing { .. }
            | Error::HeaderMismatch { .. } => ErrorKind::Assertion,
            Error::NoResponseBound { .. } => ErrorKind::Unbound,
            Error::NoTransport(_)
            | Error::UnsupportedScheme(_)
            | Error::Connect { .. }
            | Error::BuildRequest(_)
            | Error::Http(_)
            | Error::Timeout(_) => ErrorKind::Transport,
            Error::Status { .. } => ErrorKind::Status,
            Error::DecodeText(_) | Error::DecodeJson(_) => ErrorKind::Decode,
        }
    }

    /// Returns true if this error reports a failed expectation.
    pub fn is_assertion(&self) -> bool {
        self.kind() == ErrorKind::Assertion
    }
}

/// Which half of the error status range a response fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Client,
    Server,
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusClass::Client => f.write_str("Client Error"),
            StatusClass::Server => f.write_str("Server Error"),
        }
    }
}
