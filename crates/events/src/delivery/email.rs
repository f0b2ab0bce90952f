//! Email channel and its SMTP transport.
//!
//! [`EmailSender`] checks the recipient address and hands the message to a
//! [`MailTransport`]. [`SmtpMailer`] is the production transport, wrapping
//! the `lettre` async SMTP client. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`SmtpConfig::from_env`] returns
//! `None` and the email channel reports itself as not configured.

use std::sync::Arc;

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{ChannelSender, DeliveryError, Recipient};

// ---------------------------------------------------------------------------
// MailTransport
// ---------------------------------------------------------------------------

/// Collaborator that actually sends a mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// SmtpConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@bibliotech.local";

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl SmtpConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      |                             |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@bibliotech.local`  |
    /// | `SMTP_USER`     | no       |                             |
    /// | `SMTP_PASSWORD` | no       |                             |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Sends plain-text mail through an SMTP relay.
pub struct SmtpMailer {
    from: Address,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from: Address = config
            .from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| transport_error(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| transport_error(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let to: Address = to.parse().map_err(|_| DeliveryError::InvalidRecipient {
            channel: ChannelKind::Email,
            address: to.to_string(),
        })?;

        let email = Message::builder()
            .from(self.from.clone().into())
            .to(to.into())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| transport_error(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| transport_error(e.to_string()))?;
        Ok(())
    }
}

fn transport_error(message: String) -> DeliveryError {
    DeliveryError::Transport {
        channel: ChannelKind::Email,
        message,
    }
}

// ---------------------------------------------------------------------------
// EmailSender
// ---------------------------------------------------------------------------

/// Email channel. Without a transport every send fails with
/// [`DeliveryError::NotConfigured`].
pub struct EmailSender {
    transport: Option<Arc<dyn MailTransport>>,
}

impl EmailSender {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    pub fn unconfigured() -> Self {
        Self { transport: None }
    }

    /// Build from `SMTP_*` environment variables.
    pub fn from_env() -> Self {
        let Some(config) = SmtpConfig::from_env() else {
            tracing::warn!("SMTP_HOST not set, email notifications are disabled");
            return Self::unconfigured();
        };
        match SmtpMailer::new(&config) {
            Ok(mailer) => Self::new(Arc::new(mailer)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build SMTP mailer, email notifications are disabled");
                Self::unconfigured()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        let address = recipient.require_address(ChannelKind::Email)?;
        if address.parse::<Address>().is_err() {
            return Err(DeliveryError::InvalidRecipient {
                channel: ChannelKind::Email,
                address: address.to_string(),
            });
        }
        let transport = self
            .transport
            .as_ref()
            .ok_or(DeliveryError::NotConfigured(ChannelKind::Email))?;

        transport.send_mail(address, subject, message).await?;
        tracing::info!(to = address, subject, "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
