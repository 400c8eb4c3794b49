//! Business-level interpretation of API responses.
//!
//! A call can succeed at the HTTP level while Binance reports a failure in
//! the body. These predicates answer "did the order get created / closed /
//! refunded?". They accept an [`ApiResult`] or an already-decoded JSON body
//! and never fail: anything that is not a JSON object of the expected shape
//! yields `false`.

use serde_json::Value;

use crate::result::ApiResult;

/// Anything a decoded response body can be extracted from.
pub trait ResponseBody {
    /// The decoded body, if there is one.
    fn response_body(&self) -> Option<&Value>;
}

impl ResponseBody for ApiResult {
    fn response_body(&self) -> Option<&Value> {
        self.as_success()
    }
}

impl ResponseBody for Value {
    fn response_body(&self) -> Option<&Value> {
        Some(self)
    }
}

impl<T: ResponseBody> ResponseBody for Option<T> {
    fn response_body(&self) -> Option<&Value> {
        self.as_ref().and_then(ResponseBody::response_body)
    }
}

impl<T: ResponseBody + ?Sized> ResponseBody for &T {
    fn response_body(&self) -> Option<&Value> {
        (**self).response_body()
    }
}

/// Returns the body as a JSON object, reporting anything else.
fn object<'a, R: ResponseBody + ?Sized>(
    response: &'a R,
    check: &'static str,
) -> Option<&'a serde_json::Map<String, Value>> {
    #[cfg(not(feature = "telemetry"))]
    let _ = check;
    let Some(body) = response.response_body() else {
        #[cfg(feature = "telemetry")]
        tracing::debug!(check, "no successful response body to inspect");
        return None;
    };
    let object = body.as_object();
    if object.is_none() {
        #[cfg(feature = "telemetry")]
        tracing::debug!(check, kind = json_kind(body), "response body is not a JSON object");
    }
    object
}

#[cfg(feature = "telemetry")]
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loose truthiness: `null`, `false`, `0`, `""`, `"0"`, `[]` and `{}` are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// True iff the body has a `data` object carrying both `prepayId` and
/// `checkoutUrl`.
#[must_use]
pub fn order_was_created<R: ResponseBody + ?Sized>(response: &R) -> bool {
    object(response, "order_was_created")
        .and_then(|body| body.get("data"))
        .and_then(Value::as_object)
        .is_some_and(|data| data.contains_key("prepayId") && data.contains_key("checkoutUrl"))
}

/// The `data` payload of a close-order response, if present.
#[must_use]
pub fn closed_order_data<R: ResponseBody + ?Sized>(response: &R) -> Option<&Value> {
    object(response, "order_was_closed").and_then(|body| body.get("data"))
}

/// True iff the body has a truthy `data` entry.
///
/// This mirrors the remote contract, where a successful close answers with
/// `"data": true`; it does not compare `status`.
#[must_use]
pub fn order_was_closed<R: ResponseBody + ?Sized>(response: &R) -> bool {
    closed_order_data(response).is_some_and(is_truthy)
}

/// True iff the body's `status` is exactly `"SUCCESS"`.
#[must_use]
pub fn order_was_refunded<R: ResponseBody + ?Sized>(response: &R) -> bool {
    object(response, "order_was_refunded")
        .and_then(|body| body.get("status"))
        .and_then(Value::as_str)
        == Some("SUCCESS")
}
