#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Binance Pay merchant API.
//!
//! This crate holds everything about talking to Binance Pay that does not
//! depend on an HTTP stack: credentials, request signing, validated request
//! bodies, the uniform [`ApiResult`] outcome and the helpers that interpret
//! it. The HTTP client lives in `bpay-http`.
//!
//! # Overview
//!
//! A merchant call is a signed JSON `POST`. The body is serialized once,
//! signed with HMAC-SHA512 over `timestamp\nnonce\nbody\n`, and sent with the
//! `BinancePay-*` headers. Whatever happens (success, rejection, network
//! failure) the caller gets exactly one [`ApiResult`] back and asks the
//! [`interpret`] helpers whether the order was created, closed or refunded.
//!
//! # Modules
//!
//! - [`callback`] - Callback URL resolution and host callback hooks
//! - [`config`] - Credentials, route names and environment loading
//! - [`error`] - Validation and configuration errors
//! - [`interpret`] - Business-level predicates over responses
//! - [`proto`] - Wire types for requests, refunds, balances and webhooks
//! - [`result`] - The [`ApiResult`] outcome type
//! - [`sign`] - Nonces and HMAC-SHA512 request signatures
//! - [`timestamp`] - Millisecond timestamps
//!
//! # Feature Flags
//!
//! - `telemetry` - Emits tracing events when responses have an unexpected shape
//! - `cli` - Derives `clap::ValueEnum` for enums used as CLI arguments

pub mod callback;
pub mod config;
pub mod error;
pub mod interpret;
pub mod proto;
pub mod result;
pub mod sign;
pub mod timestamp;

pub use callback::{CallbackHandler, CallbackUrlResolver, NoCallbacks, NoopCallbacks, RouteTable};
pub use config::{CallbackRoutes, ClientConfig, Credentials};
pub use error::{ConfigError, SignatureError, ValidationError};
pub use result::{ApiError, ApiResult, ErrorKind, UnclassifiedResponse};
pub use sign::{Nonce, SignedRequest, Signer};
pub use timestamp::TimestampMs;
