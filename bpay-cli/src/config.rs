//! CLI configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//! Credentials missing from the file fall back to the `BINANCE_*` variables.
//!
//! # Example Configuration
//!
//! ```toml
//! api_key = "$BINANCE_KEY"
//! api_secret = "${BINANCE_SECRET}"
//! api_url = "https://bpay.binanceapi.com/"
//! callback_base_url = "https://shop.example/"
//! timeout_secs = 30
//!
//! [routes]
//! webhook = "binance-webhookUrl"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `bpay.toml`)
//! - `BINANCE_KEY`, `BINANCE_SECRET`, `BINANCE_API_URL` - used when the file
//!   does not set the corresponding value

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bpay::config::{
    CallbackRoutes, ClientConfig, ENV_API_KEY, ENV_API_SECRET, ENV_API_URL,
};
use bpay::{ConfigError, RouteTable};
use serde::Deserialize;
use url::Url;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "bpay.toml";

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level CLI configuration.
#[derive(Clone, Default, Deserialize)]
pub struct CliConfig {
    /// API key. Falls back to `BINANCE_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret. Falls back to `BINANCE_SECRET`.
    #[serde(default)]
    pub api_secret: Option<String>,

    /// API base URL. Falls back to `BINANCE_API_URL`, then the production URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Base URL of the merchant site; enables callback URLs on created orders.
    #[serde(default)]
    pub callback_base_url: Option<Url>,

    /// Total request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Callback route names.
    #[serde(default)]
    pub routes: CallbackRoutes,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("api_key", &self.api_key)
            .field("has_api_secret", &self.api_secret.is_some())
            .field("api_url", &self.api_url)
            .field("callback_base_url", &self.callback_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("routes", &self.routes)
            .finish()
    }
}

impl CliConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `bpay.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, LoadError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::load_from(Path::new(&path))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error: every value then comes from the
    /// environment or its default.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        Self::parse(&content, |name| std::env::var(name).ok())
    }

    /// Parses TOML `content` after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] if the expanded content is invalid.
    pub fn parse<F>(content: &str, lookup: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Resolves the client configuration, file values first, then the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if credentials are missing or the base URL is
    /// invalid.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        self.client_config_with(|name| std::env::var(name).ok())
    }

    /// Same as [`CliConfig::client_config`] with an explicit environment.
    ///
    /// # Errors
    ///
    /// See [`CliConfig::client_config`].
    pub fn client_config_with<F>(&self, env: F) -> Result<ClientConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_file = |name: &str| -> Option<String> {
            let value = match name {
                ENV_API_KEY => self.api_key.as_ref(),
                ENV_API_SECRET => self.api_secret.as_ref(),
                ENV_API_URL => self.api_url.as_ref(),
                _ => None,
            }?;
            if value.trim_start().starts_with('$') {
                tracing::warn!(variable = name, "Configuration value not resolved (missing env var?)");
                return None;
            }
            Some(value.clone())
        };
        let config = ClientConfig::from_lookup(|name| from_file(name).or_else(|| env(name)))?;
        Ok(config.with_routes(self.routes.clone()))
    }

    /// Callback routes under `callback_base_url`, if one is configured.
    #[must_use]
    pub fn route_table(&self) -> Option<RouteTable> {
        self.callback_base_url
            .clone()
            .map(|base| RouteTable::with_default_routes(base, &self.routes))
    }

    /// The configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match (name.is_empty(), lookup(&name)) {
            (false, Some(value)) => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = env(&[("KEY", "k1"), ("SECRET", "s_2")]);
        assert_eq!(expand_env_vars("a = \"$KEY\"", &lookup), "a = \"k1\"");
        assert_eq!(expand_env_vars("${SECRET}-x", &lookup), "s_2-x");
        assert_eq!(expand_env_vars("$MISSING and ${GONE}", &lookup), "$MISSING and ${GONE}");
        assert_eq!(expand_env_vars("cost: 5$", &lookup), "cost: 5$");
        assert_eq!(expand_env_vars("$KEY.$KEY", &lookup), "k1.k1");
    }

    #[test]
    fn test_parse_and_resolve() {
        let content = r#"
            api_key = "$BK"
            api_secret = "${BS}"
            callback_base_url = "https://shop.example/"
            timeout_secs = 5

            [routes]
            webhook = "hooks.binance"
        "#;
        let cli = CliConfig::parse(content, env(&[("BK", "key"), ("BS", "secret")])).unwrap();
        assert_eq!(cli.timeout(), Some(Duration::from_secs(5)));
        assert!(cli.route_table().is_some());

        let config = cli.client_config_with(env(&[])).unwrap();
        assert_eq!(config.credentials.api_key, "key");
        assert_eq!(config.credentials.api_secret, "secret");
        assert_eq!(config.credentials.api_url.as_str(), "https://bpay.binanceapi.com/");
        assert_eq!(config.routes.webhook, "hooks.binance");
        assert_eq!(config.routes.success, "binance-successUrl");
    }

    #[test]
    fn test_empty_file_falls_back_to_environment() {
        let cli = CliConfig::parse("", env(&[])).unwrap();
        assert!(cli.route_table().is_none());

        let config = cli
            .client_config_with(env(&[
                ("BINANCE_KEY", "env-key"),
                ("BINANCE_SECRET", "env-secret"),
                ("BINANCE_API_URL", "http://127.0.0.1:8080/"),
            ]))
            .unwrap();
        assert_eq!(config.credentials.api_key, "env-key");
        assert_eq!(config.credentials.api_url.as_str(), "http://127.0.0.1:8080/");

        let err = cli.client_config_with(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("BINANCE_KEY")));
    }

    #[test]
    fn test_unresolved_reference_is_missing() {
        let cli = CliConfig::parse(r#"api_key = "$NOPE""#, env(&[])).unwrap();
        let err = cli
            .client_config_with(env(&[("BINANCE_SECRET", "s")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("BINANCE_KEY")));
    }

    #[test]
    fn test_debug_hides_secret() {
        let cli = CliConfig::parse(r#"api_secret = "hunter2""#, env(&[])).unwrap();
        assert!(!format!("{cli:?}").contains("hunter2"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cli = CliConfig::load_from(Path::new("/nonexistent/bpay.toml")).unwrap();
        assert!(cli.api_key.is_none());
        assert_eq!(cli.routes, CallbackRoutes::default());
    }
}
