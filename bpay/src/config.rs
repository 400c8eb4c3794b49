//! Client configuration.
//!
//! A [`ClientConfig`] is resolved once, either explicitly, from a config file
//! (it implements `Deserialize`), or from the process environment via
//! [`ClientConfig::from_env`], and is immutable afterwards.
//!
//! # Environment Variables
//!
//! - `BINANCE_KEY` - API key, sent as the certificate serial number
//! - `BINANCE_SECRET` - API secret used for HMAC signing
//! - `BINANCE_API_URL` - optional base URL override

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://bpay.binanceapi.com/";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "BINANCE_KEY";

/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "BINANCE_SECRET";

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "BINANCE_API_URL";

/// Default route name of the success redirect.
pub const DEFAULT_SUCCESS_ROUTE: &str = "binance-successUrl";

/// Default route name of the cancel redirect.
pub const DEFAULT_CANCEL_ROUTE: &str = "binance-cancelUrl";

/// Default route name of the webhook.
pub const DEFAULT_WEBHOOK_ROUTE: &str = "binance-webhookUrl";

/// API key, secret and base URL.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// API key; also the `BinancePay-Certificate-SN` header value.
    pub api_key: String,

    /// HMAC secret.
    pub api_secret: String,

    /// Base URL the endpoint paths are joined onto.
    #[serde(default = "default_api_url")]
    pub api_url: Url,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl Credentials {
    /// Creates credentials against the production base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_url: default_api_url(),
        }
    }

    /// Joins an endpoint path onto the base URL.
    ///
    /// A base URL without a trailing slash is treated as a directory, so
    /// `https://host/proxy` + `a/b` gives `https://host/proxy/a/b`.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        base.join(path.trim_start_matches('/'))
    }
}

/// Route names the callback URLs are resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRoutes {
    /// Success redirect route (receives `merchantTradeNo`).
    #[serde(default = "default_success_route")]
    pub success: String,

    /// Cancel redirect route (receives `merchantTradeNo`).
    #[serde(default = "default_cancel_route")]
    pub cancel: String,

    /// Webhook route.
    #[serde(default = "default_webhook_route")]
    pub webhook: String,
}

impl Default for CallbackRoutes {
    fn default() -> Self {
        Self {
            success: default_success_route(),
            cancel: default_cancel_route(),
            webhook: default_webhook_route(),
        }
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid URL")
}

fn default_success_route() -> String {
    DEFAULT_SUCCESS_ROUTE.to_owned()
}

fn default_cancel_route() -> String {
    DEFAULT_CANCEL_ROUTE.to_owned()
}

fn default_webhook_route() -> String {
    DEFAULT_WEBHOOK_ROUTE.to_owned()
}

/// Everything a payment client needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API credentials.
    #[serde(flatten)]
    pub credentials: Credentials,

    /// Callback route names.
    #[serde(default)]
    pub routes: CallbackRoutes,
}

impl ClientConfig {
    /// Creates a configuration with default base URL and route names.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
            routes: CallbackRoutes::default(),
        }
    }

    /// Resolves the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] if `BINANCE_KEY` or
    /// `BINANCE_SECRET` is unset or empty, and [`ConfigError::BaseUrl`] if
    /// `BINANCE_API_URL` is set but not a valid URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        let mut config = Self::new(required(ENV_API_KEY)?, required(ENV_API_SECRET)?);
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_api_url(&url)?;
        }
        Ok(config)
    }

    /// Overrides the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseUrl`] if `url` does not parse.
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.credentials.api_url = Url::parse(url.trim()).map_err(|source| ConfigError::BaseUrl {
            url: url.to_owned(),
            source,
        })?;
        Ok(self)
    }

    /// Overrides the callback route names.
    #[must_use]
    pub fn with_routes(mut self, routes: CallbackRoutes) -> Self {
        self.routes = routes;
        self
    }
}
