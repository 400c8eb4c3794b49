//! Authentication and dispatch of incoming webhook notifications.
//!
//! Binance Pay posts order status changes to the merchant's webhook with the
//! same `BinancePay-*` headers outgoing requests carry. [`WebhookVerifier`]
//! recomputes the signature over the raw body and checks the timestamp is
//! recent; [`WebhookReceiver`] additionally decodes the notification, hands it
//! to a [`CallbackHandler`] and returns the acknowledgement body.
//!
//! Both work on plain `http` types so they fit any server framework.

use std::time::Duration;

use bpay::callback::CallbackHandler;
use bpay::config::ClientConfig;
use bpay::proto::{MerchantTradeNo, WebhookAck, WebhookNotification};
use bpay::{Signer, TimestampMs, ValidationError};
use http::HeaderMap;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::WebhookError;
use crate::headers;

/// Authenticates webhook requests.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    signer: Signer,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Default accepted clock skew between sender and receiver.
    pub const DEFAULT_TOLERANCE: Duration = Duration::from_mins(5);

    /// Creates a verifier for signatures made with `signer`'s secret.
    #[must_use]
    pub const fn new(signer: Signer) -> Self {
        Self {
            signer,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }

    /// Creates a verifier from the client configuration's credentials.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Signer::new(
            &config.credentials.api_key,
            &config.credentials.api_secret,
        ))
    }

    /// Sets the accepted clock skew.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the accepted clock skew.
    #[must_use]
    pub const fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies `headers` and `body` against the current time.
    ///
    /// # Errors
    ///
    /// See [`WebhookVerifier::verify_at`].
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, body, TimestampMs::now())
    }

    /// Verifies `headers` and `body` as of `now`.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::MissingHeader`] / [`WebhookError::InvalidHeader`] for absent or unreadable headers
    /// - [`WebhookError::Stale`] if the timestamp is further than the tolerance from `now`
    /// - [`WebhookError::Encoding`] if the body is not UTF-8
    /// - [`WebhookError::Signature`] if the signature does not match
    pub fn verify_at(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        now: TimestampMs,
    ) -> Result<(), WebhookError> {
        let presented = headers::decode(headers)?;
        let skew = u128::from(presented.timestamp.abs_diff(now));
        if skew > self.tolerance.as_millis() {
            return Err(WebhookError::Stale {
                timestamp: presented.timestamp,
                now,
            });
        }
        let body = std::str::from_utf8(body)?;
        self.signer
            .verify(presented.timestamp, &presented.nonce, body, &presented.signature)?;
        Ok(())
    }
}

/// Verifies notifications and dispatches them to a [`CallbackHandler`].
#[derive(Debug, Clone)]
pub struct WebhookReceiver<H> {
    verifier: WebhookVerifier,
    handler: H,
}

impl<H: CallbackHandler> WebhookReceiver<H> {
    /// Creates a receiver.
    pub const fn new(verifier: WebhookVerifier, handler: H) -> Self {
        Self { verifier, handler }
    }

    /// Returns the handler.
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Handles one webhook request and returns the body to answer with.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] if the request is not authentic or not a
    /// notification; the handler is not called in that case.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "bpay.webhook.handle", skip_all, err)
    )]
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookAck, WebhookError> {
        self.verifier.verify(headers, body)?;
        let notification: WebhookNotification = serde_json::from_slice(body)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(
            biz_type = %notification.biz_type,
            biz_status = %notification.biz_status,
            "Webhook notification received"
        );

        Ok(self.handler.on_webhook(&notification).await)
    }

    /// Handles the success redirect for `merchant_trade_no`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `merchant_trade_no` is not a valid
    /// merchant trade number.
    pub async fn success(&self, merchant_trade_no: &str) -> Result<(), ValidationError> {
        let merchant_trade_no = MerchantTradeNo::new(merchant_trade_no)?;
        self.handler.on_success(&merchant_trade_no).await;
        Ok(())
    }

    /// Handles the cancel redirect for `merchant_trade_no`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `merchant_trade_no` is not a valid
    /// merchant trade number.
    pub async fn cancel(&self, merchant_trade_no: &str) -> Result<(), ValidationError> {
        let merchant_trade_no = MerchantTradeNo::new(merchant_trade_no)?;
        self.handler.on_cancel(&merchant_trade_no).await;
        Ok(())
    }
}
