//! The uniform outcome of one API call.
//!
//! Every operation yields exactly one [`ApiResult`]. Remote rejections,
//! server failures and network failures are values of this type rather than
//! `Err`s, so callers branch on the variant and decide how to present it.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::interpret;

/// Category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The remote side answered with a 5xx status.
    ServerError,
    /// The remote side rejected the request (4xx with an error code).
    ClientError,
    /// 403 without an error code.
    Forbidden,
    /// DNS resolution or connection establishment failed.
    HostNotFound,
    /// Any other transport failure: timeout, TLS, reading the body.
    TransportError,
    /// The request body could not be built.
    InvalidRequest,
}

impl ErrorKind {
    /// Stable label, as serialized in the `error` field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::Forbidden => "forbidden",
            Self::HostNotFound => "host_not_found",
            Self::TransportError => "transport_error",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized error record: `{code, error, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// Remote error code, sentinel code, or OS error number. `None` when
    /// nothing meaningful is available.
    pub code: Option<String>,
    /// What went wrong.
    #[serde(rename = "error")]
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ApiError {
    /// Creates an error record.
    pub fn new(kind: ErrorKind, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{code}]: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// A response that fits none of the success or error shapes.
///
/// Produced for 4xx responses without an error code (other than 403), for
/// 2xx responses whose body is not JSON, and for 1xx/3xx statuses. The raw
/// body is kept so the caller can decide; no message is invented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnclassifiedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Outcome of one API call.
///
/// Serializes untagged: a success as its JSON body, an error as
/// `{"code":..,"error":..,"message":..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResult {
    /// 2xx with a JSON body.
    Success(Value),
    /// 4xx rejection.
    ClientError(ApiError),
    /// 5xx failure.
    ServerError(ApiError),
    /// No usable HTTP response.
    TransportError(ApiError),
    /// Response of an unexpected shape.
    Unclassified(UnclassifiedResponse),
}

impl ApiResult {
    /// Whether the call succeeded at the HTTP level.
    ///
    /// Binance may still report a business failure inside the body; use the
    /// interpretation helpers for that.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The decoded body of a successful call.
    #[must_use]
    pub const fn as_success(&self) -> Option<&Value> {
        match self {
            Self::Success(body) => Some(body),
            _ => None,
        }
    }

    /// The error record of a failed call.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::ClientError(e) | Self::ServerError(e) | Self::TransportError(e) => Some(e),
            Self::Success(_) | Self::Unclassified(_) => None,
        }
    }

    /// Converts into a `Result`, folding every non-success into `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the original value if it is not [`ApiResult::Success`].
    pub fn into_success(self) -> Result<Value, Self> {
        match self {
            Self::Success(body) => Ok(body),
            other => Err(other),
        }
    }

    /// See [`interpret::order_was_created`].
    #[must_use]
    pub fn order_was_created(&self) -> bool {
        interpret::order_was_created(self)
    }

    /// See [`interpret::order_was_closed`].
    #[must_use]
    pub fn order_was_closed(&self) -> bool {
        interpret::order_was_closed(self)
    }

    /// See [`interpret::order_was_refunded`].
    #[must_use]
    pub fn order_was_refunded(&self) -> bool {
        interpret::order_was_refunded(self)
    }
}
