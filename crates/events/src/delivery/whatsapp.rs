//! WhatsApp channel.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use super::gateway::MessageGateway;
use super::{dial_string, truncate_with_ellipsis, ChannelSender, DeliveryError, Recipient};

/// Maximum WhatsApp body length in characters.
pub const WHATSAPP_MAX_CHARS: usize = 4096;

/// Accepted length of a stripped number, `+` included.
const MIN_LEN: usize = 11;
const MAX_LEN: usize = 16;

/// Sends chat messages through a [`MessageGateway`].
pub struct WhatsAppSender {
    gateway: Arc<dyn MessageGateway>,
}

impl WhatsAppSender {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }

    /// Strip and validate a number. WhatsApp requires international format.
    pub fn normalize(address: &str) -> Result<String, DeliveryError> {
        let number = dial_string(address);
        if number.starts_with('+') && (MIN_LEN..=MAX_LEN).contains(&number.len()) {
            Ok(number)
        } else {
            Err(DeliveryError::InvalidRecipient {
                channel: ChannelKind::WhatsApp,
                address: address.to_string(),
            })
        }
    }

    /// Bold subject, blank line, then the message.
    pub fn format_body(subject: &str, message: &str) -> String {
        let subject = subject.trim();
        let body = if subject.is_empty() {
            message.to_string()
        } else {
            format!("*{subject}*\n\n{message}")
        };
        truncate_with_ellipsis(&body, WHATSAPP_MAX_CHARS)
    }
}

#[async_trait]
impl ChannelSender for WhatsAppSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        let address = recipient.require_address(ChannelKind::WhatsApp)?;
        let number = Self::normalize(address)?;
        let body = Self::format_body(subject, message);

        self.gateway
            .deliver(ChannelKind::WhatsApp, &number, &body)
            .await?;
        tracing::info!(to = %number, "WhatsApp message sent");
        Ok(())
    }
}
