//! Error types for the HTTP layer.

use bpay::{ApiError, ErrorKind, SignatureError, TimestampMs};

/// No usable HTTP response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// Name resolution or connection establishment failed.
    #[error("Could not resolve host: {url}")]
    HostNotFound {
        /// OS error number, or 0.
        code: i32,
        /// The URL that was requested.
        url: String,
    },
    /// Any other failure: timeout, TLS, redirect loop, reading the body.
    #[error("{message}")]
    Transport {
        /// OS error number, HTTP status, or 0.
        code: i32,
        /// Description from the HTTP stack.
        message: String,
    },
}

impl TransportFailure {
    /// The numeric code carried by either variant.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::HostNotFound { code, .. } | Self::Transport { code, .. } => *code,
        }
    }
}

impl From<TransportFailure> for ApiError {
    fn from(failure: TransportFailure) -> Self {
        let kind = match failure {
            TransportFailure::HostNotFound { .. } => ErrorKind::HostNotFound,
            TransportFailure::Transport { .. } => ErrorKind::TransportError,
        };
        Self::new(kind, Some(failure.code().to_string()), failure.to_string())
    }
}

/// A [`PaymentClient`](crate::client::PaymentClient) could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    /// An endpoint URL could not be derived from the base URL.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The underlying HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[source] reqwest::Error),
}

/// An incoming webhook notification was rejected.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// A required `BinancePay-*` header is absent.
    #[error("missing header {0}")]
    MissingHeader(&'static str),

    /// A header is present but unreadable.
    #[error("invalid header {0}")]
    InvalidHeader(&'static str),

    /// The timestamp is outside the accepted window.
    #[error("timestamp {timestamp} is outside the accepted window (now {now})")]
    Stale {
        /// Timestamp presented by the sender.
        timestamp: TimestampMs,
        /// Local time of the check.
        now: TimestampMs,
    },

    /// The signature does not authenticate the body.
    #[error("signature rejected: {0}")]
    Signature(#[from] SignatureError),

    /// The body is not UTF-8.
    #[error("body is not UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The body is not a notification.
    #[error("malformed notification: {0}")]
    Body(#[from] serde_json::Error),
}
