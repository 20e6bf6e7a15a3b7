//! reqwest-backed [`WebhookTransport`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::trace;

use crate::config::WebhookConfig;
use crate::domain::errors::{WebhookError, WebhookResult};
use crate::ports::outbound::{WebhookRequest, WebhookTransport, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &WebhookConfig) -> WebhookResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(&self, request: &WebhookRequest) -> WebhookResult<()> {
        trace!(url = %request.url, bytes = request.body.len(), "[sp-06] POST webhook");
        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, &request.signature)
            .header(TIMESTAMP_HEADER, request.timestamp.to_string())
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status.as_u16()));
        }
        Ok(())
    }
}
