//! Refund and refund-query request types.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::order::non_empty;
use crate::error::ValidationError;
use crate::timestamp::TimestampMs;

/// Maximum length of a refund request id.
pub const REFUND_REQUEST_ID_MAX_LEN: usize = 64;

/// Merchant-assigned idempotency key for one refund attempt.
///
/// Binance treats two refund calls with the same id as the same refund, so
/// an id is derived once per attempt and reused on every retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RefundRequestId(String);

impl RefundRequestId {
    /// Derives `refund-payment-{prepay_id}-on-{YYYY-MM-DD_HH:MM:SS}` (UTC),
    /// truncated to 64 characters.
    ///
    /// Two derivations for the same prepay id within the same second agree.
    #[must_use]
    pub fn derive(prepay_id: &str, at: TimestampMs) -> Self {
        let stamp = at.to_utc_secs().map_or_else(
            || at.as_secs().to_string(),
            |dt| dt.format("%Y-%m-%d_%H:%M:%S").to_string(),
        );
        let full = format!("refund-payment-{prepay_id}-on-{stamp}");
        Self(full.chars().take(REFUND_REQUEST_ID_MAX_LEN).collect())
    }

    /// Wraps an id obtained elsewhere, e.g. from an earlier refund response.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for a blank id and
    /// [`ValidationError::RefundRequestId`] for one longer than 64 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = non_empty("refundRequestId", value.into())?;
        if value.chars().count() > REFUND_REQUEST_ID_MAX_LEN {
            return Err(ValidationError::RefundRequestId(value));
        }
        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RefundRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One refund attempt against a paid order.
///
/// Build it once and pass the same value to every retry of
/// the refund call: the embedded [`RefundRequestId`] is what makes retries safe.
/// The sum of all refunds for an order must not exceed the order amount;
/// Binance enforces this, not the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    refund_request_id: RefundRequestId,
    prepay_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    refund_amount: Decimal,
}

impl RefundRequest {
    /// Starts a refund attempt now.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty prepay id or a non-positive amount.
    pub fn new(prepay_id: impl Into<String>, refund_amount: Decimal) -> Result<Self, ValidationError> {
        Self::at(prepay_id, refund_amount, TimestampMs::now())
    }

    /// Starts a refund attempt whose id is derived from `at`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty prepay id or a non-positive amount.
    pub fn at(
        prepay_id: impl Into<String>,
        refund_amount: Decimal,
        at: TimestampMs,
    ) -> Result<Self, ValidationError> {
        let prepay_id = non_empty("prepayId", prepay_id.into())?;
        let refund_request_id = RefundRequestId::derive(&prepay_id, at);
        Self::with_id(refund_request_id, prepay_id, refund_amount)
    }

    /// Resumes a refund attempt with a previously issued id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty prepay id or a non-positive amount.
    pub fn with_id(
        refund_request_id: RefundRequestId,
        prepay_id: impl Into<String>,
        refund_amount: Decimal,
    ) -> Result<Self, ValidationError> {
        let prepay_id = non_empty("prepayId", prepay_id.into())?;
        if refund_amount <= Decimal::ZERO {
            return Err(ValidationError::RefundAmount(refund_amount.to_string()));
        }
        Ok(Self {
            refund_request_id,
            prepay_id,
            refund_amount,
        })
    }

    /// The idempotency key of this attempt.
    #[must_use]
    pub const fn refund_request_id(&self) -> &RefundRequestId {
        &self.refund_request_id
    }

    /// The order being refunded.
    #[must_use]
    pub fn prepay_id(&self) -> &str {
        &self.prepay_id
    }

    /// Amount to refund.
    #[must_use]
    pub const fn refund_amount(&self) -> Decimal {
        self.refund_amount
    }
}

/// Body of the refund query call.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuery<'a> {
    /// The refund to look up.
    pub refund_request_id: &'a RefundRequestId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const T0: TimestampMs = TimestampMs::from_millis(1_700_000_000_000);

    #[test]
    fn test_wrapped_id_is_kept_whole_or_rejected() {
        let exact = "x".repeat(REFUND_REQUEST_ID_MAX_LEN);
        assert_eq!(RefundRequestId::new(exact.clone()).unwrap().as_str(), exact);

        let long = "x".repeat(70);
        assert_eq!(
            RefundRequestId::new(long.clone()).unwrap_err(),
            ValidationError::RefundRequestId(long)
        );
    }

    #[test]
    fn test_derived_id_format() {
        let id = RefundRequestId::derive("29383937493038367292", T0);
        assert_eq!(id.as_str(), "refund-payment-29383937493038367292-on-2023-11-14_22:13:20");
        assert!(id.as_str().len() <= REFUND_REQUEST_ID_MAX_LEN);
    }

    #[test]
    fn test_derived_id_stable_within_a_second() {
        let a = RefundRequestId::derive("p1", T0);
        let b = RefundRequestId::derive("p1", TimestampMs::from_millis(1_700_000_000_999));
        assert_eq!(a, b);
    }

    #[test]
    fn test_derived_id_differs_per_prepay_id() {
        assert_ne!(RefundRequestId::derive("p1", T0), RefundRequestId::derive("p2", T0));
    }

    #[test]
    fn test_long_prepay_id_is_truncated() {
        let id = RefundRequestId::derive(&"9".repeat(80), T0);
        assert_eq!(id.as_str().len(), REFUND_REQUEST_ID_MAX_LEN);
        assert!(id.as_str().starts_with("refund-payment-999"));
    }

    #[test]
    fn test_refund_request_reuses_id() {
        let request = RefundRequest::at("p1", dec!(0.5), T0).unwrap();
        let retry = request.clone();
        assert_eq!(request.refund_request_id(), retry.refund_request_id());
    }

    #[test]
    fn test_refund_request_body() {
        let request = RefundRequest::at("p1", dec!(0.5), T0).unwrap();
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"refundRequestId":"refund-payment-p1-on-2023-11-14_22:13:20","prepayId":"p1","refundAmount":0.5}"#
        );
    }

    #[test]
    fn test_refund_request_validation() {
        assert_eq!(
            RefundRequest::at("p1", dec!(0), T0).unwrap_err(),
            ValidationError::RefundAmount("0".to_owned())
        );
        assert_eq!(
            RefundRequest::at("", dec!(1), T0).unwrap_err(),
            ValidationError::Empty("prepayId")
        );
        assert!(RefundRequestId::new(" ").is_err());
    }
}
