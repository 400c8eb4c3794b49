//! Mapping of raw HTTP responses onto [`ApiResult`].
//!
//! | Status | Body | Result |
//! |---|---|---|
//! | 5xx | any | `ServerError`, code `"500"`, fixed message |
//! | 4xx | JSON with `code` | `ClientError` with the remote code and `errorMessage` |
//! | 403 | no `code` | `ClientError` of kind `Forbidden` |
//! | other 4xx | no `code` | `Unclassified` |
//! | 2xx | JSON | `Success` |
//! | 2xx | not JSON | `Unclassified` |
//! | 1xx, 3xx | any | `Unclassified` |

use bpay::{ApiError, ApiResult, ErrorKind, UnclassifiedResponse};
use serde_json::Value;

use crate::constants::{
    CLIENT_ERROR_MESSAGE, FORBIDDEN_MESSAGE, SERVER_ERROR_CODE, SERVER_ERROR_MESSAGE,
};
use crate::transport::RawResponse;

/// Turns a [`RawResponse`] into an [`ApiResult`]. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classifies `response`.
    #[must_use]
    pub fn classify(&self, response: &RawResponse) -> ApiResult {
        match response.status {
            500..=599 => ApiResult::ServerError(ApiError::new(
                ErrorKind::ServerError,
                Some(SERVER_ERROR_CODE.to_owned()),
                SERVER_ERROR_MESSAGE,
            )),
            400..=499 => Self::client_error(response),
            200..=299 => match serde_json::from_str::<Value>(&response.body) {
                Ok(body) => ApiResult::Success(body),
                Err(_) => Self::unclassified(response),
            },
            _ => Self::unclassified(response),
        }
    }

    fn client_error(response: &RawResponse) -> ApiResult {
        let body = serde_json::from_str::<Value>(&response.body).ok();

        if let Some(code) = field(body.as_ref(), "code") {
            let message = field(body.as_ref(), "errorMessage")
                .and_then(Value::as_str)
                .unwrap_or(CLIENT_ERROR_MESSAGE);
            return ApiResult::ClientError(ApiError::new(
                ErrorKind::ClientError,
                Some(code_to_string(code)),
                message,
            ));
        }
        if response.status == 403 {
            return ApiResult::ClientError(ApiError::new(
                ErrorKind::Forbidden,
                None,
                FORBIDDEN_MESSAGE,
            ));
        }
        Self::unclassified(response)
    }

    fn unclassified(response: &RawResponse) -> ApiResult {
        ApiResult::Unclassified(UnclassifiedResponse {
            status: response.status,
            body: response.body.clone(),
        })
    }
}

fn field<'a>(body: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    body.and_then(|b| b.get(name)).filter(|v| !v.is_null())
}

/// Remote codes are usually strings; numbers are rendered without quotes.
fn code_to_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(status: u16, body: &str) -> ApiResult {
        ResponseClassifier.classify(&RawResponse::new(status, body))
    }

    #[test]
    fn test_success() {
        let body = json!({"status": "SUCCESS", "code": "000000", "data": {"prepayId": "p1"}});
        assert_eq!(classify(200, &body.to_string()), ApiResult::Success(body));
    }

    #[test]
    fn test_server_error_discards_remote_code() {
        let result = classify(500, r#"{"code":"999","errorMessage":"db down"}"#);
        let err = result.error().unwrap();
        assert!(matches!(result, ApiResult::ServerError(_)));
        assert_eq!(err.code.as_deref(), Some("500"));
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.message, "External server side error.");

        assert!(matches!(classify(503, "<html>"), ApiResult::ServerError(_)));
    }

    #[test]
    fn test_client_error_with_code() {
        let result = classify(400, r#"{"status":"FAIL","code":"400201","errorMessage":"Bad merchantTradeNo"}"#);
        assert_eq!(
            result,
            ApiResult::ClientError(ApiError::new(
                ErrorKind::ClientError,
                Some("400201".to_owned()),
                "Bad merchantTradeNo"
            ))
        );

        let numeric = classify(400, r#"{"code":400002}"#);
        let err = numeric.error().unwrap();
        assert_eq!(err.code.as_deref(), Some("400002"));
        assert_eq!(err.message, "An unexpected error occurred");
    }

    #[test]
    fn test_forbidden_without_code() {
        let result = classify(403, "");
        assert_eq!(
            result,
            ApiResult::ClientError(ApiError::new(
                ErrorKind::Forbidden,
                None,
                "You don't have permission to access this resource."
            ))
        );
        assert!(matches!(classify(403, r#"{"code":null}"#), ApiResult::ClientError(_)));
    }

    #[test]
    fn test_other_shapes_are_unclassified() {
        assert_eq!(
            classify(404, "not found"),
            ApiResult::Unclassified(UnclassifiedResponse {
                status: 404,
                body: "not found".to_owned()
            })
        );
        assert!(matches!(classify(200, "<html>"), ApiResult::Unclassified(_)));
        assert!(matches!(classify(200, ""), ApiResult::Unclassified(_)));
        assert!(matches!(classify(302, ""), ApiResult::Unclassified(_)));
        assert!(matches!(classify(101, ""), ApiResult::Unclassified(_)));
    }
}
