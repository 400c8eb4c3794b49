//! Callback URL resolution and callback hooks.
//!
//! Order creation needs absolute URLs for three endpoints the host
//! application exposes: the success redirect, the cancel redirect and the
//! webhook. The client only knows their symbolic route names and asks an
//! injected [`CallbackUrlResolver`] to turn them into URLs, so it does not
//! depend on any routing system.
//!
//! What happens when those endpoints are hit is business logic of the host;
//! [`CallbackHandler`] is the hook it implements.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::config::CallbackRoutes;
use crate::proto::{MerchantTradeNo, WebhookAck, WebhookNotification};

/// Route parameter carrying the merchant trade number.
pub const MERCHANT_TRADE_NO_PARAM: &str = "merchantTradeNo";

/// Default path template of the success redirect.
pub const DEFAULT_SUCCESS_PATH: &str = "binance/success/{merchantTradeNo}";

/// Default path template of the cancel redirect.
pub const DEFAULT_CANCEL_PATH: &str = "binance/cancel/{merchantTradeNo}";

/// Default path template of the webhook.
pub const DEFAULT_WEBHOOK_PATH: &str = "binance/webhook";

/// Turns a route name plus parameters into an absolute URL.
///
/// Returning `None` means the route does not exist; the corresponding URL is
/// then left out of the request.
pub trait CallbackUrlResolver: Send + Sync {
    /// Resolves `route` with `params` (name, value pairs).
    fn resolve(&self, route: &str, params: &[(&str, &str)]) -> Option<Url>;
}

impl<F> CallbackUrlResolver for F
where
    F: Fn(&str, &[(&str, &str)]) -> Option<Url> + Send + Sync,
{
    fn resolve(&self, route: &str, params: &[(&str, &str)]) -> Option<Url> {
        self(route, params)
    }
}

/// Resolver that knows no routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallbacks;

impl CallbackUrlResolver for NoCallbacks {
    fn resolve(&self, _route: &str, _params: &[(&str, &str)]) -> Option<Url> {
        None
    }
}

/// Named path templates joined onto a base URL.
///
/// Templates are `/`-separated; a segment written `{name}` is replaced by the
/// percent-encoded value of the parameter `name`. Parameters that do not
/// appear in the template are appended as query pairs. A template whose
/// placeholder has no matching parameter does not resolve.
#[derive(Clone)]
pub struct RouteTable {
    base: Url,
    routes: HashMap<String, String>,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("base", &self.base.as_str())
            .field("routes", &self.routes)
            .finish()
    }
}

impl RouteTable {
    /// Creates an empty table rooted at `base`.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            base,
            routes: HashMap::new(),
        }
    }

    /// Creates a table with the three default callback paths registered
    /// under the names in `names`.
    #[must_use]
    pub fn with_default_routes(base: Url, names: &CallbackRoutes) -> Self {
        Self::new(base)
            .route(&names.success, DEFAULT_SUCCESS_PATH)
            .route(&names.cancel, DEFAULT_CANCEL_PATH)
            .route(&names.webhook, DEFAULT_WEBHOOK_PATH)
    }

    /// Registers (or replaces) a named route.
    #[must_use]
    pub fn route(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.routes.insert(name.into(), template.into());
        self
    }

    /// Whether a route with this name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }
}

impl CallbackUrlResolver for RouteTable {
    fn resolve(&self, route: &str, params: &[(&str, &str)]) -> Option<Url> {
        let template = self.routes.get(route)?;
        let mut used = vec![false; params.len()];
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => {
                        let idx = params.iter().position(|(key, _)| *key == name)?;
                        used[idx] = true;
                        segments.push(params[idx].1);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }
        let extra: Vec<_> = params
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(pair, _)| *pair)
            .collect();
        if !extra.is_empty() {
            url.query_pairs_mut().extend_pairs(extra);
        }
        Some(url)
    }
}

/// Hooks the host application implements for the callback endpoints.
///
/// All methods default to doing nothing (and acknowledging webhooks).
#[async_trait::async_trait]
pub trait CallbackHandler: Send + Sync {
    /// The buyer returned through the success redirect.
    async fn on_success(&self, _merchant_trade_no: &MerchantTradeNo) {}

    /// The buyer returned through the cancel redirect.
    async fn on_cancel(&self, _merchant_trade_no: &MerchantTradeNo) {}

    /// A verified notification arrived on the webhook.
    async fn on_webhook(&self, _notification: &WebhookNotification) -> WebhookAck {
        WebhookAck::success()
    }
}

/// Handler that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCallbacks;

impl CallbackHandler for NoopCallbacks {}
