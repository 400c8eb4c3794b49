//! HTTP-specific constants for the Binance Pay API.

/// Request nonce header.
pub const NONCE_HEADER: &str = "BinancePay-Nonce";

/// API key header.
pub const CERTIFICATE_SN_HEADER: &str = "BinancePay-Certificate-SN";

/// Upper-case hex HMAC-SHA512 signature header.
pub const SIGNATURE_HEADER: &str = "BinancePay-Signature";

/// Millisecond timestamp header.
pub const TIMESTAMP_HEADER: &str = "BinancePay-Timestamp";

/// Create order (v2).
pub const CREATE_ORDER_PATH: &str = "binancepay/openapi/v2/order";

/// Query order (v2).
pub const QUERY_ORDER_PATH: &str = "binancepay/openapi/v2/order/query";

/// Close order.
pub const CLOSE_ORDER_PATH: &str = "binancepay/openapi/order/close";

/// Refund order.
pub const REFUND_ORDER_PATH: &str = "binancepay/openapi/order/refund";

/// Query refund.
pub const QUERY_REFUND_PATH: &str = "binancepay/openapi/order/refund/query";

/// Wallet balance (v2).
pub const BALANCE_PATH: &str = "binancepay/openapi/v2/balance";

/// Message of every 5xx result; the remote body is discarded.
pub const SERVER_ERROR_MESSAGE: &str = "External server side error.";

/// Code of every 5xx result.
pub const SERVER_ERROR_CODE: &str = "500";

/// Message of a 4xx result whose body carries a code but no message.
pub const CLIENT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Message of a 403 without an error code.
pub const FORBIDDEN_MESSAGE: &str = "You don't have permission to access this resource.";
