//! Webhook delivery configuration.

use std::env;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "subscription-protocol-webhooks/",
    env!("CARGO_PKG_VERSION")
);

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Whole-request timeout. There is no retry at the HTTP layer.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl WebhookConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SP_WEBHOOK_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `SP_WEBHOOK_USER_AGENT`: `User-Agent` header
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = env::var("SP_WEBHOOK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let user_agent = env::var("SP_WEBHOOK_USER_AGENT").unwrap_or(defaults.user_agent);

        Self {
            timeout,
            user_agent,
        }
    }
}
