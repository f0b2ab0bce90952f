//! Chooses the active notifier from configuration.
//!
//! The channel is read once at start-up. [`select_notifier`] maps the
//! configured [`ChannelKind`] to a [`Notifier`] variant; `multi` builds a
//! [`MultiChannelSender`] over every single channel.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;

use crate::delivery::{
    ChannelSender, DeliveryError, EmailSender, LogGateway, MessageGateway, MultiChannelSender,
    Recipient, SmsSender, WebhookGateway, WhatsAppSender,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Notification settings read at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub channel: ChannelKind,
    /// Multi-channel policy: every channel must succeed.
    pub require_all_success: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::Email,
            require_all_success: false,
        }
    }
}

impl NotificationConfig {
    /// Load from the environment.
    ///
    /// | Variable                            | Default |
    /// |-------------------------------------|---------|
    /// | `NOTIFICATION_CHANNEL`              | `email` |
    /// | `NOTIFICATION_REQUIRE_ALL_SUCCESS`  | `false` |
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("NOTIFICATION_CHANNEL").ok().as_deref(),
            std::env::var("NOTIFICATION_REQUIRE_ALL_SUCCESS")
                .ok()
                .as_deref(),
        )
    }

    /// Build from raw setting values. Unknown channels fall back to email.
    pub fn from_values(channel: Option<&str>, require_all_success: Option<&str>) -> Self {
        let channel = match channel {
            None => ChannelKind::Email,
            Some(label) => ChannelKind::parse(label).unwrap_or_else(|| {
                tracing::warn!(
                    channel = label,
                    "Unknown notification channel, falling back to email"
                );
                ChannelKind::Email
            }),
        };
        let require_all_success = require_all_success
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Self {
            channel,
            require_all_success,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel set
// ---------------------------------------------------------------------------

/// One instance of every single channel.
#[derive(Clone)]
pub struct ChannelSet {
    pub email: Arc<EmailSender>,
    pub sms: Arc<SmsSender>,
    pub whatsapp: Arc<WhatsAppSender>,
}

impl ChannelSet {
    /// Build channels from the environment.
    ///
    /// SMTP comes from `SMTP_*`. SMS and WhatsApp post to
    /// `SMS_WEBHOOK_URL` / `WHATSAPP_WEBHOOK_URL` when set, otherwise they
    /// only log the message.
    pub fn from_env() -> Self {
        Self {
            email: Arc::new(EmailSender::from_env()),
            sms: Arc::new(SmsSender::new(gateway_from_env("SMS_WEBHOOK_URL"))),
            whatsapp: Arc::new(WhatsAppSender::new(gateway_from_env(
                "WHATSAPP_WEBHOOK_URL",
            ))),
        }
    }
}

fn gateway_from_env(var: &str) -> Arc<dyn MessageGateway> {
    match WebhookGateway::from_env(var) {
        Some(gateway) => {
            tracing::info!(var, url = gateway.url(), "Using webhook gateway");
            Arc::new(gateway)
        }
        None => Arc::new(LogGateway),
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// The active notification channel.
pub enum Notifier {
    Email(Arc<EmailSender>),
    Sms(Arc<SmsSender>),
    WhatsApp(Arc<WhatsAppSender>),
    Multi(MultiChannelSender),
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Notifier::Email(_) => "Email",
            Notifier::Sms(_) => "Sms",
            Notifier::WhatsApp(_) => "WhatsApp",
            Notifier::Multi(_) => "Multi",
        };
        f.debug_tuple(name).finish_non_exhaustive()
    }
}

/// Map the configured channel to a notifier.
pub fn select_notifier(config: &NotificationConfig, channels: &ChannelSet) -> Notifier {
    let notifier = match config.channel {
        ChannelKind::Email => Notifier::Email(Arc::clone(&channels.email)),
        ChannelKind::Sms => Notifier::Sms(Arc::clone(&channels.sms)),
        ChannelKind::WhatsApp => Notifier::WhatsApp(Arc::clone(&channels.whatsapp)),
        ChannelKind::Multi => Notifier::Multi(
            MultiChannelSender::new(config.require_all_success)
                .with_channel(channels.email.clone())
                .with_channel(channels.sms.clone())
                .with_channel(channels.whatsapp.clone()),
        ),
    };
    tracing::info!(
        channel = %config.channel,
        require_all_success = config.require_all_success,
        "Notification channel selected"
    );
    notifier
}

#[async_trait]
impl ChannelSender for Notifier {
    fn kind(&self) -> ChannelKind {
        match self {
            Self::Email(_) => ChannelKind::Email,
            Self::Sms(_) => ChannelKind::Sms,
            Self::WhatsApp(_) => ChannelKind::WhatsApp,
            Self::Multi(_) => ChannelKind::Multi,
        }
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        match self {
            Self::Email(s) => s.send(recipient, subject, message).await,
            Self::Sms(s) => s.send(recipient, subject, message).await,
            Self::WhatsApp(s) => s.send(recipient, subject, message).await,
            Self::Multi(s) => s.send(recipient, subject, message).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
