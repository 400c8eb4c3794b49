//! The Binance Pay merchant client.
//!
//! [`PaymentClient`] exposes the six merchant operations. Each one builds its
//! request body, signs it, sends it through the configured [`Transport`] and
//! classifies the response. Every call yields exactly one [`ApiResult`]:
//! failures of any kind are values, not `Err`s.
//!
//! ## Features
//!
//! - Pluggable [`Transport`], [`ReqwestTransport`] by default
//! - Callback URLs resolved through an injected [`CallbackUrlResolver`]
//! - Integrates with `tracing` if the `telemetry` feature is enabled

use std::fmt;
use std::sync::Arc;

use bpay::callback::{CallbackUrlResolver, MERCHANT_TRADE_NO_PARAM, NoCallbacks};
use bpay::config::{CallbackRoutes, ClientConfig};
use bpay::proto::{
    BalanceQuery, CallbackUrls, CreateOrder, MerchantTradeNo, OrderRef, RefundQuery,
    RefundRequest, RefundRequestId, Wallet,
};
use bpay::{ApiError, ApiResult, ErrorKind, Signer};
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::classify::ResponseClassifier;
use crate::constants::{
    BALANCE_PATH, CLOSE_ORDER_PATH, CREATE_ORDER_PATH, QUERY_ORDER_PATH, QUERY_REFUND_PATH,
    REFUND_ORDER_PATH,
};
use crate::error::ClientBuildError;
use crate::headers;
use crate::transport::{ReqwestTransport, Transport};

/// Absolute URLs of the merchant endpoints.
#[derive(Debug, Clone)]
struct Endpoints {
    create_order: Url,
    query_order: Url,
    close_order: Url,
    refund_order: Url,
    query_refund: Url,
    balance: Url,
}

/// Client for the Binance Pay merchant API.
///
/// Cheap to clone; all state is immutable and shared.
#[derive(Clone)]
pub struct PaymentClient {
    signer: Signer,
    endpoints: Endpoints,
    routes: CallbackRoutes,
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn CallbackUrlResolver>,
    classifier: ResponseClassifier,
}

impl fmt::Debug for PaymentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentClient")
            .field("signer", &self.signer)
            .field("create_order_url", &self.endpoints.create_order.as_str())
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl PaymentClient {
    /// Builds a client from `config`, with a default [`ReqwestTransport`] and
    /// no callback URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::UrlParse`] if an endpoint URL cannot be
    /// derived from the configured base URL.
    pub fn try_new(config: &ClientConfig) -> Result<Self, ClientBuildError> {
        let credentials = &config.credentials;
        let endpoint = |path: &'static str, context: &'static str| {
            credentials
                .endpoint(path)
                .map_err(|source| ClientBuildError::UrlParse { context, source })
        };
        let endpoints = Endpoints {
            create_order: endpoint(CREATE_ORDER_PATH, "Failed to construct create order URL")?,
            query_order: endpoint(QUERY_ORDER_PATH, "Failed to construct query order URL")?,
            close_order: endpoint(CLOSE_ORDER_PATH, "Failed to construct close order URL")?,
            refund_order: endpoint(REFUND_ORDER_PATH, "Failed to construct refund URL")?,
            query_refund: endpoint(QUERY_REFUND_PATH, "Failed to construct refund query URL")?,
            balance: endpoint(BALANCE_PATH, "Failed to construct balance URL")?,
        };
        Ok(Self {
            signer: Signer::new(&credentials.api_key, &credentials.api_secret),
            endpoints,
            routes: config.routes.clone(),
            transport: Arc::new(ReqwestTransport::new()),
            resolver: Arc::new(NoCallbacks),
            classifier: ResponseClassifier,
        })
    }

    /// Replaces the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replaces the callback URL resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl CallbackUrlResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Returns the signer.
    #[must_use]
    pub const fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Returns the computed create-order URL.
    #[must_use]
    pub const fn create_order_url(&self) -> &Url {
        &self.endpoints.create_order
    }

    /// Resolves the success, cancel and webhook URLs for an order.
    #[must_use]
    pub fn callback_urls(&self, merchant_trade_no: &MerchantTradeNo) -> CallbackUrls {
        let params = [(MERCHANT_TRADE_NO_PARAM, merchant_trade_no.as_str())];
        CallbackUrls {
            return_url: self.resolver.resolve(&self.routes.success, &params),
            cancel_url: self.resolver.resolve(&self.routes.cancel, &params),
            webhook_url: self.resolver.resolve(&self.routes.webhook, &[]),
        }
    }

    /// Creates an order (`POST binancepay/openapi/v2/order`).
    ///
    /// Check the outcome with [`ApiResult::order_was_created`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.create_order",
            skip_all,
            fields(
                merchant_trade_no = %order.merchant_trade_no,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            )
        )
    )]
    pub async fn create_order(&self, order: &CreateOrder) -> ApiResult {
        let urls = self.callback_urls(&order.merchant_trade_no);
        self.post(&self.endpoints.create_order, "POST order", &order.to_body(urls))
            .await
    }

    /// Queries an order (`POST binancepay/openapi/v2/order/query`).
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.query_order",
            skip_all,
            fields(otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn query_order(&self, order: &OrderRef) -> ApiResult {
        self.post(&self.endpoints.query_order, "POST order/query", order)
            .await
    }

    /// Closes an unpaid order (`POST binancepay/openapi/order/close`).
    ///
    /// Check the outcome with [`ApiResult::order_was_closed`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.close_order",
            skip_all,
            fields(otel.status_code = tracing::field::Empty, error.message = tracing::field::Empty)
        )
    )]
    pub async fn close_order(&self, order: &OrderRef) -> ApiResult {
        self.post(&self.endpoints.close_order, "POST order/close", order)
            .await
    }

    /// Refunds a paid order (`POST binancepay/openapi/order/refund`).
    ///
    /// Retrying with the same `refund` value reuses its refund request id,
    /// so a retry cannot refund twice. Check the outcome with
    /// [`ApiResult::order_was_refunded`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.refund_order",
            skip_all,
            fields(
                refund_request_id = %refund.refund_request_id(),
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            )
        )
    )]
    pub async fn refund_order(&self, refund: &RefundRequest) -> ApiResult {
        self.post(&self.endpoints.refund_order, "POST order/refund", refund)
            .await
    }

    /// Queries a refund (`POST binancepay/openapi/order/refund/query`).
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.query_refund_order",
            skip_all,
            fields(
                refund_request_id = %refund_request_id,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            )
        )
    )]
    pub async fn query_refund_order(&self, refund_request_id: &RefundRequestId) -> ApiResult {
        let body = RefundQuery { refund_request_id };
        self.post(&self.endpoints.query_refund, "POST order/refund/query", &body)
            .await
    }

    /// Reads wallet balances (`POST binancepay/openapi/v2/balance`).
    ///
    /// Without `currency`, every asset of the wallet is returned.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "bpay.client.get_balance",
            skip_all,
            fields(
                wallet = %wallet,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            )
        )
    )]
    pub async fn get_balance(&self, wallet: Wallet, currency: Option<&str>) -> ApiResult {
        let body = BalanceQuery { wallet, currency };
        self.post(&self.endpoints.balance, "POST balance", &body)
            .await
    }

    /// Signs `body`, sends it and classifies the response.
    ///
    /// `context` identifies the call in error messages.
    async fn post<T>(&self, url: &Url, context: &'static str, body: &T) -> ApiResult
    where
        T: serde::Serialize + Sync + ?Sized,
    {
        let result = match self.signer.envelope(body) {
            Ok(request) => match headers::encode(&request.headers) {
                Ok(headers) => match self.transport.post(url, &headers, request.body).await {
                    Ok(response) => self.classifier.classify(&response),
                    Err(failure) => ApiResult::TransportError(failure.into()),
                },
                Err(e) => invalid_request(context, "invalid header value", &e),
            },
            Err(e) => invalid_request(context, "failed to serialize body", &e),
        };

        record_result_on_span(&result);

        result
    }
}

fn invalid_request(context: &str, what: &str, err: &dyn fmt::Display) -> ApiResult {
    ApiResult::TransportError(ApiError::new(
        ErrorKind::InvalidRequest,
        None,
        format!("{context}: {what}: {err}"),
    ))
}

/// Records the outcome of a call on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span(result: &ApiResult) {
    let span = Span::current();
    match result {
        ApiResult::Success(_) => {
            span.record("otel.status_code", "OK");
        }
        ApiResult::ClientError(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::WARN, error = %err, "Binance Pay rejected the request");
        }
        ApiResult::ServerError(err) | ApiResult::TransportError(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to Binance Pay failed");
        }
        ApiResult::Unclassified(response) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", "unclassified response");
            tracing::event!(
                tracing::Level::WARN,
                status = response.status,
                "Unexpected response from Binance Pay"
            );
        }
    }
}

/// Records the outcome of a call on the current span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
const fn record_result_on_span(_result: &ApiResult) {}

#[cfg(test)]
mod tests {
    use super::*;
    use bpay::callback::RouteTable;
    use bpay::TimestampMs;
    use bpay::interpret;
    use bpay::sign::Nonce;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::TransportFailure;
    use crate::transport::RawResponse;

    const KEY: &str = "test-api-key";
    const SECRET: &str = "test-api-secret";

    fn client_for(server: &MockServer) -> PaymentClient {
        let config = ClientConfig::new(KEY, SECRET)
            .with_api_url(&server.uri())
            .unwrap();
        PaymentClient::try_new(&config).unwrap()
    }

    fn order(trade_no: &str) -> CreateOrder {
        CreateOrder::try_new(trade_no, dec!(1), "USDT", "02", "Z000", "api-test", "Testing the API")
            .unwrap()
    }

    fn signed_post(endpoint: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header("content-type", "application/json"))
            .and(header("BinancePay-Certificate-SN", KEY))
            .and(header_exists("BinancePay-Nonce"))
            .and(header_exists("BinancePay-Timestamp"))
            .and(header_exists("BinancePay-Signature"))
    }

    /// Recomputes the signature of a received request from its own bytes.
    fn assert_signed(request: &wiremock::Request) {
        let header = |name: &str| request.headers.get(name).unwrap().to_str().unwrap().to_owned();
        let timestamp: TimestampMs = header("BinancePay-Timestamp").parse().unwrap();
        let nonce = Nonce::from(header("BinancePay-Nonce"));
        assert_eq!(nonce.as_str().len(), 32);
        let body = std::str::from_utf8(&request.body).unwrap();
        Signer::new(KEY, SECRET)
            .verify(timestamp, &nonce, body, &header("BinancePay-Signature"))
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_then_close_order() {
        let server = MockServer::start().await;
        signed_post("/binancepay/openapi/v2/order")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "code": "000000",
                "data": {
                    "prepayId": "29383937493038367292",
                    "terminalType": "WEB",
                    "expireTime": 1_700_003_600_000_u64,
                    "checkoutUrl": "https://pay.binance.com/checkout/abc"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        signed_post("/binancepay/openapi/order/close")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "code": "000000",
                "data": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let order = order("TX123");

        let created = client.create_order(&order).await;
        assert!(created.order_was_created());
        assert!(interpret::order_was_created(&created));

        let closed = client
            .close_order(&OrderRef::by_merchant_trade_no(order.merchant_trade_no.clone()))
            .await;
        assert!(closed.order_was_closed());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_signed(request);
        }

        let create_body = std::str::from_utf8(&requests[0].body).unwrap();
        assert!(create_body.starts_with(r#"{"env":{"terminalType":"WEB"},"merchantTradeNo":"TX123","orderAmount":1"#));
        assert!(!create_body.contains("returnUrl"));
        assert!(!create_body.contains("null"));
        assert_eq!(
            std::str::from_utf8(&requests[1].body).unwrap(),
            r#"{"merchantTradeNo":"TX123"}"#
        );
    }

    #[tokio::test]
    async fn test_callback_urls_are_sent() {
        let server = MockServer::start().await;
        signed_post("/binancepay/openapi/v2/order")
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .mount(&server)
            .await;

        let routes = RouteTable::with_default_routes(
            Url::parse("https://shop.example/").unwrap(),
            &CallbackRoutes::default(),
        );
        let client = client_for(&server).with_resolver(routes);

        let result = client.create_order(&order("TX9")).await;
        assert!(result.is_success());
        assert!(!result.order_was_created());

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["returnUrl"], "https://shop.example/binance/success/TX9");
        assert_eq!(body["cancelUrl"], "https://shop.example/binance/cancel/TX9");
        assert_eq!(body["webhookUrl"], "https://shop.example/binance/webhook");
    }

    #[tokio::test]
    async fn test_query_refund_and_balance_bodies() {
        let server = MockServer::start().await;
        for endpoint in [
            "/binancepay/openapi/v2/order/query",
            "/binancepay/openapi/order/refund",
            "/binancepay/openapi/order/refund/query",
            "/binancepay/openapi/v2/balance",
        ] {
            signed_post(endpoint)
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "status": "SUCCESS",
                    "code": "000000",
                    "data": {}
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        let refund = RefundRequest::at(
            "29383937493038367292",
            dec!(0.5),
            TimestampMs::from_millis(1_700_000_000_000),
        )
        .unwrap();

        let queried = client
            .query_order(&OrderRef::by_prepay_id("29383937493038367292").unwrap())
            .await;
        assert!(queried.is_success());
        let refunded = client.refund_order(&refund).await;
        assert!(refunded.order_was_refunded());
        let refund_status = client.query_refund_order(refund.refund_request_id()).await;
        assert!(refund_status.is_success());
        let balance = client.get_balance(Wallet::SpotWallet, Some("USDT")).await;
        assert!(balance.is_success());

        let bodies: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| String::from_utf8(r.body.clone()).unwrap())
            .collect();
        assert_eq!(bodies[0], r#"{"prepayId":"29383937493038367292"}"#);
        assert_eq!(
            bodies[1],
            r#"{"refundRequestId":"refund-payment-29383937493038367292-on-2023-11-14_22:13:20","prepayId":"29383937493038367292","refundAmount":0.5}"#
        );
        assert_eq!(
            bodies[2],
            r#"{"refundRequestId":"refund-payment-29383937493038367292-on-2023-11-14_22:13:20"}"#
        );
        assert_eq!(bodies[3], r#"{"wallet":"SPOT_WALLET","currency":"USDT"}"#);
    }

    #[tokio::test]
    async fn test_error_statuses_become_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/binancepay/openapi/v2/order"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/binancepay/openapi/order/close"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": "FAIL",
                "code": "400201",
                "errorMessage": "merchantTradeNo is invalid or already used"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/binancepay/openapi/v2/balance"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let created = client.create_order(&order("TX1")).await;
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            json!({"code": "500", "error": "server_error", "message": "External server side error."})
        );
        assert!(!created.order_was_created());

        let closed = client
            .close_order(&OrderRef::by_merchant_trade_no(MerchantTradeNo::new("TX1").unwrap()))
            .await;
        let err = closed.error().unwrap();
        assert_eq!(err.kind, ErrorKind::ClientError);
        assert_eq!(err.code.as_deref(), Some("400201"));
        assert!(!closed.order_was_closed());

        let balance = client.get_balance(Wallet::FundingWallet, None).await;
        assert_eq!(balance.error().unwrap().kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = ClientConfig::new(KEY, SECRET)
            .with_api_url("http://127.0.0.1:1/")
            .unwrap();
        let client = PaymentClient::try_new(&config).unwrap();

        let result = client.get_balance(Wallet::SpotWallet, None).await;
        let ApiResult::TransportError(err) = &result else {
            panic!("expected a transport error, got {result:?}");
        };
        assert_eq!(err.kind, ErrorKind::HostNotFound);
        assert_eq!(
            err.message,
            "Could not resolve host: http://127.0.0.1:1/binancepay/openapi/v2/balance"
        );
    }

    struct CannedTransport(Result<RawResponse, TransportFailure>);

    #[async_trait::async_trait]
    impl Transport for CannedTransport {
        async fn post(
            &self,
            _url: &Url,
            _headers: &http::HeaderMap,
            _body: String,
        ) -> Result<RawResponse, TransportFailure> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_custom_transport() {
        let client = PaymentClient::try_new(&ClientConfig::new(KEY, SECRET))
            .unwrap()
            .with_transport(CannedTransport(Ok(RawResponse::new(
                200,
                r#"{"status":"SUCCESS","data":{"prepayId":"p","checkoutUrl":"c"}}"#,
            ))));
        assert!(client.create_order(&order("TX2")).await.order_was_created());

        let client = client.with_transport(CannedTransport(Err(TransportFailure::Transport {
            code: 0,
            message: "tls handshake eof".to_owned(),
        })));
        let result = client.get_balance(Wallet::SpotWallet, None).await;
        assert_eq!(result.error().unwrap().kind, ErrorKind::TransportError);
    }

    #[tokio::test]
    async fn test_invalid_api_key_is_invalid_request() {
        let client = PaymentClient::try_new(&ClientConfig::new("bad\nkey", SECRET))
            .unwrap()
            .with_transport(CannedTransport(Ok(RawResponse::new(200, "{}"))));
        let result = client.get_balance(Wallet::SpotWallet, None).await;
        assert_eq!(result.error().unwrap().kind, ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_endpoint_urls_and_debug() {
        let config = ClientConfig::new(KEY, SECRET);
        let client = PaymentClient::try_new(&config).unwrap();
        assert_eq!(
            client.create_order_url().as_str(),
            "https://bpay.binanceapi.com/binancepay/openapi/v2/order"
        );
        let debug = format!("{client:?}");
        assert!(debug.contains(KEY));
        assert!(!debug.contains(SECRET));
    }
}
