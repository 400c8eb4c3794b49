//! Wire types for the Binance Pay merchant API.
//!
//! Request bodies are plain `Serialize` structs. Their field declaration order
//! is the JSON key order, which is part of the request signature, so fields
//! must not be reordered. Absent optional fields are omitted rather than sent
//! as `null`.
//!
//! - [`order`] - create, query and close order bodies and validated inputs
//! - [`refund`] - refund and refund-query bodies, refund idempotency keys
//! - [`balance`] - wallet balance query
//! - [`webhook`] - incoming order notifications and the acknowledgement body

pub mod balance;
pub mod order;
pub mod refund;
pub mod webhook;

pub use balance::{BalanceQuery, Wallet};
pub use order::{
    CallbackUrls, CreateOrder, CreateOrderBody, Env, Goods, GoodsName, GoodsType,
    MerchantTradeNo, OrderAmount, OrderCurrency, OrderRef,
};
pub use refund::{RefundQuery, RefundRequest, RefundRequestId};
pub use webhook::{WebhookAck, WebhookNotification};
