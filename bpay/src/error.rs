//! Error types for request construction and configuration.
//!
//! Failures of the remote API never surface here: they are reported as
//! [`ApiResult`](crate::result::ApiResult) values. These errors cover what can
//! go wrong *before* a request is sent.

/// A request input violated a documented Binance Pay constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Merchant trade number is empty, too long, or not alphanumeric.
    #[error("merchantTradeNo must be 1-32 ASCII letters or digits, got {0:?}")]
    MerchantTradeNo(String),

    /// Order amount below the accepted minimum.
    #[error("orderAmount must be at least 0.01, got {0}")]
    OrderAmount(String),

    /// Refund amount is zero or negative.
    #[error("refundAmount must be positive, got {0}")]
    RefundAmount(String),

    /// Currency not in the accepted set.
    #[error("unsupported order currency {0:?} (expected BUSD, USDT or MBOX)")]
    Currency(String),

    /// Goods type is neither `01` nor `02`.
    #[error("goodsType must be \"01\" or \"02\", got {0:?}")]
    GoodsType(String),

    /// Goods name is empty or contains a prohibited character.
    #[error("goodsName must be non-empty and free of backslashes, quotes and emoji, got {0:?}")]
    GoodsName(String),

    /// Wallet not in the accepted set.
    #[error("unsupported wallet {0:?} (expected FUNDING_WALLET or SPOT_WALLET)")]
    Wallet(String),

    /// Refund request id longer than Binance accepts.
    #[error("refundRequestId must be at most 64 characters, got {0:?}")]
    RefundRequestId(String),

    /// A required identifier was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Client configuration could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The API base URL could not be parsed.
    #[error("invalid API base URL {url:?}: {source}")]
    BaseUrl {
        /// The rejected value.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// A presented signature did not authenticate the payload.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SignatureError {
    /// The signature is not valid hex.
    #[error("signature is not hex: {0}")]
    Malformed(#[from] hex::FromHexError),

    /// The signature does not match the payload.
    #[error("signature mismatch")]
    Mismatch,
}
