#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP layer for the Binance Pay merchant API.
//!
//! Sends signed requests built by [`bpay`], classifies the responses into
//! [`bpay::ApiResult`], and authenticates incoming webhook notifications.
//!
//! # Modules
//!
//! - [`classify`] - Status and body to [`bpay::ApiResult`] mapping
//! - [`client`] - [`PaymentClient`], the six merchant operations
//! - [`constants`] - Header names, endpoint paths, fixed error messages
//! - [`error`] - Transport, construction and webhook errors
//! - [`headers`] - Signature headers to and from HTTP header maps
//! - [`transport`] - The [`Transport`] seam and its `reqwest` implementation
//! - [`webhook`] - Webhook signature verification and dispatch
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing spans and events for every call
//!
//! # Example
//!
//! ```no_run
//! use bpay::ClientConfig;
//! use bpay::proto::Wallet;
//! use bpay_http::PaymentClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PaymentClient::try_new(&ClientConfig::from_env()?)?;
//! let balance = client.get_balance(Wallet::SpotWallet, Some("USDT")).await;
//! println!("{}", serde_json::to_string_pretty(&balance)?);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod client;
pub mod constants;
pub mod error;
pub mod headers;
pub mod transport;
pub mod webhook;

pub use classify::ResponseClassifier;
pub use client::PaymentClient;
pub use error::{ClientBuildError, TransportFailure, WebhookError};
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use webhook::{WebhookReceiver, WebhookVerifier};
