//! Bibliotech loan event bus and notification delivery.
//!
//! This crate provides the building blocks for reacting to loan lifecycle
//! changes and reaching borrowers:
//!
//! - [`EventBus`]: in-process observer registry for [`LoanEvent`]s with
//!   per-observer failure isolation.
//! - [`delivery`]: channel senders (email, SMS, WhatsApp) and the
//!   multi-channel aggregator.
//! - [`selector`]: resolves the active [`Notifier`] from configuration.

pub mod bus;
pub mod delivery;
pub mod selector;

pub use bus::{EventBus, LoanEvent, LoanEventType, LoanObserver, ObserverError};
pub use delivery::{ChannelSender, DeliveryError, Recipient};
pub use selector::{select_notifier, ChannelSet, NotificationConfig, Notifier};
