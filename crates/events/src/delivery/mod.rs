//! Notification channels for borrower-facing messages.
//!
//! Every channel implements [`ChannelSender`]. Senders validate the
//! recipient address for their channel before any delivery attempt and
//! report every failure as a [`DeliveryError`]; nothing here panics or
//! propagates into the loan operation that triggered the message.

pub mod email;
pub mod gateway;
pub mod multi;
pub mod sms;
pub mod webhook;
pub mod whatsapp;

use std::sync::LazyLock;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;
use bibliotech_core::library::Borrower;
use regex::Regex;

pub use email::{EmailSender, MailTransport, SmtpConfig, SmtpMailer};
pub use gateway::{LogGateway, MessageGateway};
pub use multi::{ChannelOutcome, MultiChannelSender};
pub use sms::SmsSender;
pub use webhook::WebhookGateway;
pub use whatsapp::WhatsAppSender;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a message could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The address does not have the format the channel requires.
    #[error("Invalid {channel} recipient: '{address}'")]
    InvalidRecipient {
        channel: ChannelKind,
        address: String,
    },

    /// The recipient has no address for this channel.
    #[error("Recipient has no {0} address")]
    MissingAddress(ChannelKind),

    /// The channel has no transport configured.
    #[error("{0} channel is not configured")]
    NotConfigured(ChannelKind),

    /// The transport rejected or failed the message.
    #[error("{channel} transport error: {message}")]
    Transport {
        channel: ChannelKind,
        message: String,
    },

    /// A multi-channel sender with no channels was asked to send.
    #[error("No notification channels configured")]
    NoChannels,

    /// Not enough composed channels succeeded.
    #[error("Only {succeeded} of {total} channels delivered the message")]
    Aggregate { succeeded: usize, total: usize },
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Contact points of the person a message is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Recipient {
    /// The address a channel of `kind` should use, if any.
    ///
    /// Composite channels have no address of their own.
    pub fn address_for(&self, kind: ChannelKind) -> Option<&str> {
        let address = match kind {
            ChannelKind::Email => self.email.as_deref(),
            ChannelKind::Sms | ChannelKind::WhatsApp => self.phone.as_deref(),
            ChannelKind::Multi => None,
        };
        address.map(str::trim).filter(|a| !a.is_empty())
    }

    /// Like [`address_for`](Self::address_for) but a missing address is an
    /// error.
    pub fn require_address(&self, kind: ChannelKind) -> Result<&str, DeliveryError> {
        self.address_for(kind)
            .ok_or(DeliveryError::MissingAddress(kind))
    }
}

impl From<&Borrower> for Recipient {
    fn from(borrower: &Borrower) -> Self {
        Self {
            name: borrower.name.clone(),
            email: borrower.email.clone(),
            phone: borrower.phone.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelSender
// ---------------------------------------------------------------------------

/// A notification transport with a uniform send capability.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Deliver `message` (with `subject`) to `recipient`.
    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

static NON_DIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9+]").expect("valid regex"));

/// Reduce a phone number to digits, keeping a single leading `+`.
///
/// `"+55 (11) 9999-8888"` becomes `"+551199998888"`.
pub fn dial_string(raw: &str) -> String {
    let kept = NON_DIAL_CHARS.replace_all(raw.trim(), "");
    let (prefix, rest) = match kept.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", kept.as_ref()),
    };
    let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
    format!("{prefix}{digits}")
}

/// Truncate `text` to at most `max` characters. When truncation happens the
/// last three characters are replaced with `...`.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_string_keeps_only_leading_plus() {
        assert_eq!(dial_string("+55 (11) 9999-8888"), "+551199998888");
        assert_eq!(dial_string("11 9999+8888"), "1199998888");
        assert_eq!(dial_string("++12"), "+12");
        assert_eq!(dial_string("abc"), "");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_with_ellipsis("hello", 160), "hello");
        let exact = "x".repeat(160);
        assert_eq!(truncate_with_ellipsis(&exact, 160), exact);
    }

    #[test]
    fn long_text_ends_with_ellipsis_at_limit() {
        let long = "y".repeat(200);
        let out = truncate_with_ellipsis(&long, 160);
        assert_eq!(out.chars().count(), 160);
        assert!(out.ends_with("..."));
        assert!(out.starts_with(&"y".repeat(157)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(20);
        let out = truncate_with_ellipsis(&long, 10);
        assert_eq!(out, format!("{}...", "é".repeat(7)));
    }

    #[test]
    fn recipient_picks_address_per_channel() {
        let r = Recipient {
            name: "Ana".into(),
            email: Some("ana@example.com".into()),
            phone: Some("  ".into()),
        };
        assert_eq!(r.address_for(ChannelKind::Email), Some("ana@example.com"));
        assert_eq!(r.address_for(ChannelKind::Sms), None);
        assert_eq!(r.address_for(ChannelKind::Multi), None);
        assert_eq!(
            r.require_address(ChannelKind::WhatsApp),
            Err(DeliveryError::MissingAddress(ChannelKind::WhatsApp))
        );
    }

    #[test]
    fn aggregate_error_message() {
        let err = DeliveryError::Aggregate {
            succeeded: 2,
            total: 3,
        };
        assert_eq!(
            err.to_string(),
            "Only 2 of 3 channels delivered the message"
        );
    }
}
