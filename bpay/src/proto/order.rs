//! Order creation, query and close request types.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::RngExt;
use rand::rng;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use url::Url;

use crate::error::ValidationError;

/// Maximum length of a merchant trade number.
pub const MERCHANT_TRADE_NO_MAX_LEN: usize = 32;

const TRADE_NO_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Merchant-assigned order identifier: 1-32 ASCII letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MerchantTradeNo(String);

impl MerchantTradeNo {
    /// Validates and wraps a merchant trade number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MerchantTradeNo`] if the value is empty,
    /// longer than 32 characters, or contains anything but ASCII alphanumerics.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value.len() <= MERCHANT_TRADE_NO_MAX_LEN
            && value.bytes().all(|b| b.is_ascii_alphanumeric());
        if valid {
            Ok(Self(value))
        } else {
            Err(ValidationError::MerchantTradeNo(value))
        }
    }

    /// Generates a random 32-character trade number from `[a-zA-Z0-9]`.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rng();
        let value = (0..MERCHANT_TRADE_NO_MAX_LEN)
            .map(|_| char::from(TRADE_NO_ALPHABET[rng.random_range(0..TRADE_NO_ALPHABET.len())]))
            .collect();
        Self(value)
    }

    /// Returns the trade number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MerchantTradeNo {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for MerchantTradeNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order amount in the order currency, at least `0.01`.
///
/// Serialized as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderAmount(Decimal);

impl OrderAmount {
    /// Smallest accepted order amount.
    pub const MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

    /// Validates and wraps an order amount.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OrderAmount`] if `amount` is below `0.01`.
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount >= Self::MIN {
            Ok(Self(amount))
        } else {
            Err(ValidationError::OrderAmount(amount.to_string()))
        }
    }

    /// Returns the wrapped decimal.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for OrderAmount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|_| ValidationError::OrderAmount(s.to_owned()))?;
        Self::new(amount)
    }
}

impl Serialize for OrderAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

/// Crypto currencies accepted for orders. Fiat is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderCurrency {
    /// Binance USD.
    #[cfg_attr(feature = "cli", value(name = "BUSD"))]
    Busd,
    /// Tether USD.
    #[cfg_attr(feature = "cli", value(name = "USDT"))]
    Usdt,
    /// Mobox.
    #[cfg_attr(feature = "cli", value(name = "MBOX"))]
    Mbox,
}

impl OrderCurrency {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Busd => "BUSD",
            Self::Usdt => "USDT",
            Self::Mbox => "MBOX",
        }
    }
}

impl FromStr for OrderCurrency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUSD" => Ok(Self::Busd),
            "USDT" => Ok(Self::Usdt),
            "MBOX" => Ok(Self::Mbox),
            other => Err(ValidationError::Currency(other.to_owned())),
        }
    }
}

impl fmt::Display for OrderCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of goods being sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GoodsType {
    /// `"01"`
    #[serde(rename = "01")]
    Tangible,
    /// `"02"`
    #[serde(rename = "02")]
    Virtual,
}

impl FromStr for GoodsType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "01" => Ok(Self::Tangible),
            "02" => Ok(Self::Virtual),
            other => Err(ValidationError::GoodsType(other.to_owned())),
        }
    }
}

/// Backslash, double quote, or anything rendered as emoji. Pictographs that
/// default to text presentation (such as `©`, `®`, `™`) only count when
/// followed by the emoji variation selector.
static PROHIBITED_IN_GOODS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[\\"\p{Emoji_Presentation}\p{Regional_Indicator}]|\p{Extended_Pictographic}\x{FE0F}"#,
    )
    .expect("goods name pattern is valid")
});

/// Goods name without backslashes, double quotes or emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GoodsName(String);

impl GoodsName {
    /// Validates and wraps a goods name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::GoodsName`] if the name is blank or contains
    /// a prohibited character.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() || PROHIBITED_IN_GOODS_NAME.is_match(&value) {
            Err(ValidationError::GoodsName(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The `goods` sub-object of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goods {
    /// Tangible or virtual.
    pub goods_type: GoodsType,
    /// Binance Pay goods category code, e.g. `Z000` for "others".
    pub goods_category: String,
    /// Merchant's identifier for the goods.
    pub reference_goods_id: String,
    /// Display name.
    pub goods_name: GoodsName,
}

/// Inputs for the create-order operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    /// Unique merchant order id.
    pub merchant_trade_no: MerchantTradeNo,
    /// Amount to charge.
    pub order_amount: OrderAmount,
    /// Currency to charge in.
    pub currency: OrderCurrency,
    /// What is being sold.
    pub goods: Goods,
}

impl CreateOrder {
    /// Builds an order from raw values, validating each.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn try_new(
        merchant_trade_no: &str,
        order_amount: Decimal,
        currency: &str,
        goods_type: &str,
        goods_category: &str,
        reference_goods_id: &str,
        goods_name: &str,
    ) -> Result<Self, ValidationError> {
        if goods_category.is_empty() {
            return Err(ValidationError::Empty("goodsCategory"));
        }
        if reference_goods_id.is_empty() {
            return Err(ValidationError::Empty("referenceGoodsId"));
        }
        Ok(Self {
            merchant_trade_no: MerchantTradeNo::new(merchant_trade_no)?,
            order_amount: OrderAmount::new(order_amount)?,
            currency: currency.parse()?,
            goods: Goods {
                goods_type: goods_type.parse()?,
                goods_category: goods_category.to_owned(),
                reference_goods_id: reference_goods_id.to_owned(),
                goods_name: GoodsName::new(goods_name)?,
            },
        })
    }

    /// Produces the wire body, attaching the resolved callback URLs.
    #[must_use]
    pub fn to_body(&self, urls: CallbackUrls) -> CreateOrderBody<'_> {
        CreateOrderBody {
            env: Env::web(),
            merchant_trade_no: &self.merchant_trade_no,
            order_amount: self.order_amount,
            currency: self.currency,
            goods: &self.goods,
            return_url: urls.return_url,
            cancel_url: urls.cancel_url,
            webhook_url: urls.webhook_url,
        }
    }
}

/// Terminal the order is placed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    /// Always `WEB` for this client.
    pub terminal_type: &'static str,
}

impl Env {
    /// The `{"terminalType":"WEB"}` environment.
    #[must_use]
    pub const fn web() -> Self {
        Self { terminal_type: "WEB" }
    }
}

/// Callback URLs resolved for one order. Unresolved entries are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackUrls {
    /// Where the buyer lands after paying.
    pub return_url: Option<Url>,
    /// Where the buyer lands after cancelling.
    pub cancel_url: Option<Url>,
    /// Where Binance posts order notifications.
    pub webhook_url: Option<Url>,
}

/// Wire body of `POST binancepay/openapi/v2/order`.
///
/// Field order is part of the signature and must not be rearranged.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody<'a> {
    /// Terminal environment.
    pub env: Env,
    /// Merchant order id.
    pub merchant_trade_no: &'a MerchantTradeNo,
    /// Amount to charge.
    pub order_amount: OrderAmount,
    /// Currency to charge in.
    pub currency: OrderCurrency,
    /// Goods description.
    pub goods: &'a Goods,
    /// Success redirect.
    pub return_url: Option<Url>,
    /// Cancel redirect.
    pub cancel_url: Option<Url>,
    /// Notification endpoint.
    pub webhook_url: Option<Url>,
}

/// Identifies an existing order by merchant trade number, prepay id, or both.
///
/// Body of the order query and order close calls.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    merchant_trade_no: Option<MerchantTradeNo>,
    prepay_id: Option<String>,
}

impl OrderRef {
    /// References an order by the merchant's trade number.
    #[must_use]
    pub const fn by_merchant_trade_no(merchant_trade_no: MerchantTradeNo) -> Self {
        Self {
            merchant_trade_no: Some(merchant_trade_no),
            prepay_id: None,
        }
    }

    /// References an order by its Binance prepay id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if `prepay_id` is empty.
    pub fn by_prepay_id(prepay_id: impl Into<String>) -> Result<Self, ValidationError> {
        let prepay_id = non_empty("prepayId", prepay_id.into())?;
        Ok(Self {
            merchant_trade_no: None,
            prepay_id: Some(prepay_id),
        })
    }

    /// References an order by both identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if `prepay_id` is empty.
    pub fn both(
        merchant_trade_no: MerchantTradeNo,
        prepay_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let prepay_id = non_empty("prepayId", prepay_id.into())?;
        Ok(Self {
            merchant_trade_no: Some(merchant_trade_no),
            prepay_id: Some(prepay_id),
        })
    }

    /// The merchant trade number, if set.
    #[must_use]
    pub const fn merchant_trade_no(&self) -> Option<&MerchantTradeNo> {
        self.merchant_trade_no.as_ref()
    }

    /// The prepay id, if set.
    #[must_use]
    pub fn prepay_id(&self) -> Option<&str> {
        self.prepay_id.as_deref()
    }
}

impl From<MerchantTradeNo> for OrderRef {
    fn from(value: MerchantTradeNo) -> Self {
        Self::by_merchant_trade_no(value)
    }
}

pub(crate) fn non_empty(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(value)
    }
}
