//! Error types for the console API core.
//!
//! # Design
//! `DescriptorError` is caller misuse and is reported synchronously at
//! dispatch time. `ApiError` is everything that can go wrong once a request
//! is in flight; the interceptor hands it to the descriptor's `on_error`
//! continuation. Transport failures and non-2xx statuses share `ApiError` so
//! the continuation decides what the user sees.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// A descriptor that cannot be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("request method is empty")]
    EmptyMethod,

    #[error("unsupported request method: {0}")]
    UnknownMethod(String),

    #[error("request url is empty")]
    EmptyUrl,

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure to enqueue onto the action stream.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Invalid(#[from] DescriptorError),

    /// The middleware loop has shut down.
    #[error("action stream is closed")]
    Closed,
}

/// Errors surfaced to a descriptor's `on_error` continuation and returned by
/// `ResourceClient` parse methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// DNS failure, refused connection, broken stream and the like.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    /// The HTTP client panicked while executing the call.
    #[error("http client panicked: {0}")]
    ClientPanic(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("resource not found")]
    NotFound,

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Status code of an application-level error response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid url: {reason}")]
    InvalidBaseUrl { var: &'static str, reason: String },

    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

pub(crate) fn describe_timeout(timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) => format!("{}ms", t.as_millis()),
        None => "none".to_string(),
    }
}

pub(crate) fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Map a failed client task join onto the error the caller sees.
pub(crate) fn join_failure(err: tokio::task::JoinError) -> ApiError {
    if err.is_panic() {
        ApiError::ClientPanic(panic_message(err.into_panic()))
    } else {
        ApiError::Cancelled
    }
}
