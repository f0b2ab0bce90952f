//! Fan-out over several channels with an all-or-any success policy.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use super::{ChannelSender, DeliveryError, Recipient};

/// Result of one composed channel during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: ChannelKind,
    pub result: Result<(), DeliveryError>,
}

impl ChannelOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sends the same message through every composed channel, one after the
/// other, and reduces the outcomes.
///
/// With `require_all_success` the send succeeds only if every channel
/// succeeded; otherwise one success is enough.
pub struct MultiChannelSender {
    channels: Vec<Arc<dyn ChannelSender>>,
    require_all_success: bool,
}

impl MultiChannelSender {
    pub fn new(require_all_success: bool) -> Self {
        Self {
            channels: Vec::new(),
            require_all_success,
        }
    }

    /// Compose `sender` into the fan-out.
    ///
    /// Composite senders are refused so an aggregator can never end up
    /// inside itself. Returns `true` if the sender was added.
    pub fn add_channel(&mut self, sender: Arc<dyn ChannelSender>) -> bool {
        if sender.kind().is_composite() {
            tracing::warn!("Refusing to compose a multi-channel sender into another");
            return false;
        }
        self.channels.push(sender);
        true
    }

    /// Builder form of [`add_channel`](Self::add_channel).
    pub fn with_channel(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.add_channel(sender);
        self
    }

    /// Remove every composed channel of `kind`. Returns how many were removed.
    pub fn remove_channel(&mut self, kind: ChannelKind) -> usize {
        let before = self.channels.len();
        self.channels.retain(|c| c.kind() != kind);
        before - self.channels.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    pub fn require_all_success(&self) -> bool {
        self.require_all_success
    }

    /// Send through every channel in order and return each outcome.
    pub async fn send_all(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let result = channel.send(recipient, subject, message).await;
            if let Err(e) = &result {
                tracing::warn!(channel = %channel.kind(), error = %e, "Channel failed during fan-out");
            }
            outcomes.push(ChannelOutcome {
                channel: channel.kind(),
                result,
            });
        }
        outcomes
    }

    /// Apply the success policy to a set of outcomes.
    pub fn reduce(&self, outcomes: &[ChannelOutcome]) -> Result<(), DeliveryError> {
        let total = outcomes.len();
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let ok = if self.require_all_success {
            succeeded == total
        } else {
            succeeded > 0
        };
        if ok {
            Ok(())
        } else {
            Err(DeliveryError::Aggregate { succeeded, total })
        }
    }
}

#[async_trait]
impl ChannelSender for MultiChannelSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Multi
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        if self.channels.is_empty() {
            tracing::error!("Multi-channel notifier has no channels configured");
            return Err(DeliveryError::NoChannels);
        }

        let outcomes = self.send_all(recipient, subject, message).await;
        let result = self.reduce(&outcomes);

        tracing::info!(
            total = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.succeeded()).count(),
            require_all_success = self.require_all_success,
            delivered = result.is_ok(),
            "Multi-channel send finished"
        );
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
