//! HTTP gateway with exponential-backoff retry.
//!
//! [`WebhookGateway`] POSTs each message as JSON to a provider endpoint
//! (an SMS or WhatsApp relay). Failed attempts are retried three times
//! with exponential backoff (1 s, 2 s, 4 s).

use std::time::Duration;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use super::gateway::MessageGateway;
use super::DeliveryError;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure of a single POST attempt.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookGateway
// ---------------------------------------------------------------------------

/// Delivers messages to one provider endpoint.
pub struct WebhookGateway {
    client: reqwest::Client,
    url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookGateway {
    /// Create a gateway posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        })
    }

    /// Build from the environment variable `var`, if set and non-empty.
    ///
    /// Returns `None` when the variable is absent or the client cannot be
    /// built (logged).
    pub fn from_env(var: &str) -> Option<Self> {
        let url = std::env::var(var).ok().filter(|u| !u.trim().is_empty())?;
        match Self::new(url) {
            Ok(gateway) => Some(gateway),
            Err(e) => {
                tracing::warn!(var, error = %e, "Failed to build webhook gateway, falling back to log gateway");
                None
            }
        }
    }

    /// Replace the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageGateway for WebhookGateway {
    async fn deliver(
        &self,
        channel: ChannelKind,
        address: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "channel": channel,
            "to": address,
            "body": body,
        });

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        channel = %channel,
                        error = %e,
                        "Gateway delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(&payload).await.map_err(|e| {
            tracing::error!(url = %self.url, channel = %channel, error = %e, "Gateway delivery failed after all retries");
            DeliveryError::Transport {
                channel,
                message: e.to_string(),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
