//! Order notifications pushed by Binance Pay to the merchant webhook.

use serde::{Deserialize, Serialize};

/// `bizStatus` of a successfully paid order.
pub const BIZ_STATUS_PAY_SUCCESS: &str = "PAY_SUCCESS";

/// `bizStatus` of an order closed before payment, e.g. after a close call.
pub const BIZ_STATUS_PAY_CLOSED: &str = "PAY_CLOSED";

/// A webhook notification as delivered by Binance Pay.
///
/// `data` is itself a JSON document encoded as a string; use
/// [`WebhookNotification::data_json`] to decode it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    /// Notification category, e.g. `PAY`.
    pub biz_type: String,
    /// Numeric business id. May exceed `u64`, prefer `biz_id_str`.
    #[serde(default)]
    pub biz_id: Option<serde_json::Number>,
    /// Business id as a string (the prepay id for `PAY` notifications).
    #[serde(default)]
    pub biz_id_str: Option<String>,
    /// Lifecycle status, e.g. [`BIZ_STATUS_PAY_SUCCESS`].
    pub biz_status: String,
    /// JSON-encoded details.
    #[serde(default)]
    pub data: String,
}

impl WebhookNotification {
    /// Decodes the embedded `data` document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `data` is not valid JSON.
    pub fn data_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// Whether the notification reports a completed payment.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.biz_status == BIZ_STATUS_PAY_SUCCESS
    }

    /// Whether the notification reports an order closed without payment.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.biz_status == BIZ_STATUS_PAY_CLOSED
    }
}

/// Body the webhook endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// `SUCCESS` or `FAIL`.
    pub return_code: String,
    /// Reason, on failure.
    pub return_message: Option<String>,
}

impl WebhookAck {
    /// Acknowledges the notification.
    #[must_use]
    pub fn success() -> Self {
        Self {
            return_code: "SUCCESS".to_owned(),
            return_message: None,
        }
    }

    /// Rejects the notification; Binance retries later.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            return_code: "FAIL".to_owned(),
            return_message: Some(message.into()),
        }
    }
}
