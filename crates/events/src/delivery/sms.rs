//! SMS channel.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use super::gateway::MessageGateway;
use super::{dial_string, truncate_with_ellipsis, ChannelSender, DeliveryError, Recipient};

/// Maximum SMS body length in characters.
pub const SMS_MAX_CHARS: usize = 160;

/// Accepted length of a stripped phone number.
const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 15;

/// Sends short text messages through a [`MessageGateway`].
pub struct SmsSender {
    gateway: Arc<dyn MessageGateway>,
}

impl SmsSender {
    pub fn new(gateway: Arc<dyn MessageGateway>) -> Self {
        Self { gateway }
    }

    /// Strip and validate a phone number for SMS.
    pub fn normalize(address: &str) -> Result<String, DeliveryError> {
        let number = dial_string(address);
        if (MIN_DIGITS..=MAX_DIGITS).contains(&number.len()) {
            Ok(number)
        } else {
            Err(DeliveryError::InvalidRecipient {
                channel: ChannelKind::Sms,
                address: address.to_string(),
            })
        }
    }

    /// SMS carries no subject; only the message is sent.
    pub fn format_body(message: &str) -> String {
        truncate_with_ellipsis(message, SMS_MAX_CHARS)
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(
        &self,
        recipient: &Recipient,
        _subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        let address = recipient.require_address(ChannelKind::Sms)?;
        let number = Self::normalize(address)?;
        let body = Self::format_body(message);

        self.gateway.deliver(ChannelKind::Sms, &number, &body).await?;
        tracing::info!(to = %number, chars = body.chars().count(), "SMS sent");
        Ok(())
    }
}
