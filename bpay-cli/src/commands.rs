//! The `balance` and `test-order` commands.

use bpay::ApiResult;
use bpay::ValidationError;
use bpay::proto::{
    CreateOrder, Goods, GoodsName, GoodsType, MerchantTradeNo, OrderAmount, OrderCurrency,
    OrderRef, Wallet,
};
use bpay_http::PaymentClient;
use rust_decimal::Decimal;
use std::io::{self, Write};

/// Goods category code for "others".
const TEST_GOODS_CATEGORY: &str = "Z000";

/// Reference goods id of test orders.
const TEST_REFERENCE_GOODS_ID: &str = "api-test";

/// Display name of test orders.
const TEST_GOODS_NAME: &str = "Testing the API";

/// One call made by a command, with its interpretation where one applies.
#[derive(Debug, Clone)]
pub struct Step {
    /// What was called.
    pub label: &'static str,
    /// What came back.
    pub result: ApiResult,
    /// Business outcome (created / closed) for calls that have one.
    pub outcome: Option<bool>,
}

impl Step {
    fn new(label: &'static str, result: ApiResult) -> Self {
        Self {
            label,
            result,
            outcome: None,
        }
    }

    fn with_outcome(mut self, outcome: bool) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

/// Reads the balance of `wallet`, optionally for one `currency`.
pub async fn balance(client: &PaymentClient, wallet: Wallet, currency: Option<&str>) -> Step {
    tracing::info!(%wallet, currency, "Querying balance");
    Step::new("balance", client.get_balance(wallet, currency).await)
}

/// Builds a throwaway virtual-goods order with a random trade number.
///
/// # Errors
///
/// Returns [`ValidationError`] if `amount` is below the minimum order amount.
pub fn test_order_request(
    amount: Decimal,
    currency: OrderCurrency,
) -> Result<CreateOrder, ValidationError> {
    Ok(CreateOrder {
        merchant_trade_no: MerchantTradeNo::random(),
        order_amount: OrderAmount::new(amount)?,
        currency,
        goods: Goods {
            goods_type: GoodsType::Virtual,
            goods_category: TEST_GOODS_CATEGORY.to_owned(),
            reference_goods_id: TEST_REFERENCE_GOODS_ID.to_owned(),
            goods_name: GoodsName::new(TEST_GOODS_NAME)?,
        },
    })
}

/// Creates an order, then queries it, closes it and queries it again.
///
/// The first query only runs if the order was created, the second only if it
/// was closed.
pub async fn test_order(client: &PaymentClient, order: &CreateOrder) -> Vec<Step> {
    tracing::info!(merchant_trade_no = %order.merchant_trade_no, "Creating test order");
    let reference = OrderRef::by_merchant_trade_no(order.merchant_trade_no.clone());
    let mut steps = Vec::with_capacity(4);

    let created = client.create_order(order).await;
    let was_created = created.order_was_created();
    steps.push(Step::new("create order", created).with_outcome(was_created));
    if !was_created {
        tracing::warn!("Order was not created, stopping");
        return steps;
    }

    steps.push(Step::new("query order", client.query_order(&reference).await));

    let closed = client.close_order(&reference).await;
    let was_closed = closed.order_was_closed();
    steps.push(Step::new("close order", closed).with_outcome(was_closed));
    if was_closed {
        steps.push(Step::new("query closed order", client.query_order(&reference).await));
    }

    steps
}

/// Writes each step as a heading followed by its pretty-printed result.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn write_steps<W: Write>(mut out: W, steps: &[Step]) -> io::Result<()> {
    for step in steps {
        match step.outcome {
            Some(true) => writeln!(out, "== {} (ok)", step.label)?,
            Some(false) => writeln!(out, "== {} (failed)", step.label)?,
            None => writeln!(out, "== {}", step.label)?,
        }
        let rendered = serde_json::to_string_pretty(&step.result).map_err(io::Error::other)?;
        writeln!(out, "{rendered}")?;
    }
    Ok(())
}
