//! Mapping between [`SignatureHeaders`] and HTTP header maps.

use bpay::TimestampMs;
use bpay::sign::{Nonce, SignatureHeaders};
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::constants::{CERTIFICATE_SN_HEADER, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::WebhookError;

/// Builds the full header set of a signed request, `Content-Type` included.
///
/// # Errors
///
/// Returns [`InvalidHeaderValue`] if the API key contains characters that
/// are not allowed in a header value.
pub fn encode(signature: &SignatureHeaders) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("binancepay-timestamp"),
        HeaderValue::from(signature.timestamp.as_millis()),
    );
    headers.insert(
        HeaderName::from_static("binancepay-nonce"),
        HeaderValue::from_str(signature.nonce.as_str())?,
    );
    headers.insert(
        HeaderName::from_static("binancepay-certificate-sn"),
        HeaderValue::from_str(&signature.certificate_sn)?,
    );
    headers.insert(
        HeaderName::from_static("binancepay-signature"),
        HeaderValue::from_str(&signature.signature)?,
    );
    Ok(headers)
}

/// Authentication values carried by an incoming notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedSignature {
    /// `BinancePay-Timestamp`.
    pub timestamp: TimestampMs,
    /// `BinancePay-Nonce`.
    pub nonce: Nonce,
    /// `BinancePay-Signature`.
    pub signature: String,
    /// `BinancePay-Certificate-SN`, when sent.
    pub certificate_sn: Option<String>,
}

/// Extracts the signature headers of an incoming request.
///
/// # Errors
///
/// [`WebhookError::MissingHeader`] if a required header is absent,
/// [`WebhookError::InvalidHeader`] if one is not visible ASCII or the
/// timestamp is not an integer.
pub fn decode(headers: &HeaderMap) -> Result<PresentedSignature, WebhookError> {
    let timestamp = required(headers, TIMESTAMP_HEADER)?
        .parse()
        .map_err(|_| WebhookError::InvalidHeader(TIMESTAMP_HEADER))?;
    let nonce = Nonce::from(required(headers, NONCE_HEADER)?);
    let signature = required(headers, SIGNATURE_HEADER)?.to_owned();
    let certificate_sn = optional(headers, CERTIFICATE_SN_HEADER)?.map(str::to_owned);
    Ok(PresentedSignature {
        timestamp,
        nonce,
        signature,
        certificate_sn,
    })
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    optional(headers, name)?.ok_or(WebhookError::MissingHeader(name))
}

fn optional<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, WebhookError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| WebhookError::InvalidHeader(name)))
        .transpose()
}
