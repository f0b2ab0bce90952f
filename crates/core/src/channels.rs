//! Well-known notification channel names.
//!
//! These are the values accepted by the `NOTIFICATION_CHANNEL` setting and
//! reported in delivery logs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Email delivered through the SMTP mailer.
pub const CHANNEL_EMAIL: &str = "email";

/// Short text message delivered through a telephony gateway.
pub const CHANNEL_SMS: &str = "sms";

/// WhatsApp message delivered through a chat gateway.
pub const CHANNEL_WHATSAPP: &str = "whatsapp";

/// Fan-out over every single channel above.
pub const CHANNEL_MULTI: &str = "multi";

/// All valid channel labels.
pub const VALID_CHANNELS: &[&str] = &[CHANNEL_EMAIL, CHANNEL_SMS, CHANNEL_WHATSAPP, CHANNEL_MULTI];

/// Closed set of notification channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
    WhatsApp,
    Multi,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => CHANNEL_EMAIL,
            Self::Sms => CHANNEL_SMS,
            Self::WhatsApp => CHANNEL_WHATSAPP,
            Self::Multi => CHANNEL_MULTI,
        }
    }

    /// Parse a channel label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            CHANNEL_EMAIL => Some(Self::Email),
            CHANNEL_SMS => Some(Self::Sms),
            CHANNEL_WHATSAPP => Some(Self::WhatsApp),
            CHANNEL_MULTI => Some(Self::Multi),
            _ => None,
        }
    }

    /// Whether this kind fans out to other channels.
    pub fn is_composite(self) -> bool {
        self == Self::Multi
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
