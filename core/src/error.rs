//! Error types for the market API client.
//!
//! # Design
//! Every stage of the pipeline reports failures as a [`ClientFailure`]; the
//! single [`normalize`] function turns any of them into the one public shape,
//! [`NormalizedError`]. Pure network failures never carry a `status`, and only
//! envelope failures carry a `code`, so callers can tell the kinds apart
//! without a dedicated variant per kind.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Fallback when a failure offers nothing more specific.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Fallback for an envelope failure without a message.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";

/// The only error shape surfaced to callers of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct NormalizedError {
    /// HTTP status of the response, absent when no response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Application error code, present only when an envelope was detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Always populated, never empty.
    pub message: String,
    /// Request path that failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NormalizedError {
    /// True when no response reached the client: the request was never
    /// sent, or it was sent and nothing came back. The two are told apart
    /// by the message only.
    pub fn is_network(&self) -> bool {
        self.status.is_none()
    }

    /// True when the backend answered with an envelope carrying a failure code.
    pub fn is_application(&self) -> bool {
        self.code.is_some()
    }
}

/// Failures raised by a [`Transport`](crate::transport::Transport) before any
/// response was delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    /// DNS, refused or reset connections. The detail is kept for logs only.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request was rejected before sending, e.g. a url that is not
    /// absolute.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// The message a caller should see, if this failure has a meaningful one.
    /// Connection failures defer to the generic network message.
    fn user_message(&self) -> Option<String> {
        match self {
            TransportError::Connect(_) => None,
            TransportError::Other(msg) if msg.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(error_chain(&err))
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// `err` followed by each of its sources, colon separated.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}

/// Every way a call can fail, before normalization.
#[derive(Debug, Error)]
pub enum ClientFailure {
    /// The request could not be constructed.
    #[error("failed to build request: {0}")]
    Build(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response arrived with a status outside the success range.
    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    /// An envelope arrived with a code that is not a success code.
    #[error("envelope code {code}")]
    Envelope {
        status: u16,
        code: i64,
        message: Option<String>,
    },

    /// The payload did not match the type the caller asked for.
    #[error("failed to decode response: {reason}")]
    Decode { status: u16, reason: String },
}

/// Funnel any failure into the public error shape. `path` is the request path
/// the failure belongs to.
pub fn normalize(failure: ClientFailure, path: &str) -> NormalizedError {
    let url = Some(path.to_string());
    match failure {
        ClientFailure::Build(reason) => NormalizedError {
            status: None,
            code: None,
            message: format!("Failed to build request: {reason}"),
            url,
        },
        ClientFailure::Transport(err) => NormalizedError {
            status: None,
            code: None,
            message: non_empty(err.user_message())
                .unwrap_or_else(|| NETWORK_ERROR_MESSAGE.to_string()),
            url,
        },
        ClientFailure::Http { status, body } => NormalizedError {
            status: Some(status),
            code: None,
            message: non_empty(body_message(&body)).unwrap_or_else(|| format!("HTTP {status}")),
            url,
        },
        ClientFailure::Envelope {
            status,
            code,
            message,
        } => NormalizedError {
            status: Some(status),
            code: Some(code),
            message: non_empty(message).unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string()),
            url,
        },
        ClientFailure::Decode { status, reason } => NormalizedError {
            status: Some(status),
            code: None,
            message: format!("Failed to decode response: {reason}"),
            url,
        },
    }
}

/// The `message` string of a JSON failure body, if any.
fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}
