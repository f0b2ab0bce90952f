//! Outbound transport for phone-based channels.
//!
//! SMS and WhatsApp senders format and validate the message, then hand the
//! final body to a [`MessageGateway`].

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use super::DeliveryError;

/// Delivers an already formatted body to a validated address.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn deliver(
        &self,
        channel: ChannelKind,
        address: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}

/// Gateway that only records the message in the log.
///
/// Used when no provider endpoint is configured, so the rest of the
/// notification flow behaves as if the message had been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGateway;

#[async_trait]
impl MessageGateway for LogGateway {
    async fn deliver(
        &self,
        channel: ChannelKind,
        address: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            channel = %channel,
            to = address,
            chars = body.chars().count(),
            "Simulated message delivery"
        );
        tracing::debug!(channel = %channel, to = address, body, "Simulated message body");
        Ok(())
    }
}
