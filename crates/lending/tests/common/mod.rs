#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bibliotech_core::channels::ChannelKind;
use bibliotech_core::clock::FixedClock;
use bibliotech_core::identity::ActingUser;
use bibliotech_core::library::{BookCopy, Borrower};
use bibliotech_events::{ChannelSender, DeliveryError, Recipient};
use bibliotech_lending::memory::InMemoryLibrary;
use bibliotech_lending::{LibraryStores, LoanFacade, OverdueSweep};
use chrono::NaiveDate;

pub const LIBRARY: &str = "Test Library";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A delivered (or attempted) message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Channel that records every message and can be switched to fail.
#[derive(Default)]
pub struct Outbox {
    pub sent: Mutex<Vec<Sent>>,
    failing: AtomicBool,
}

impl Outbox {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChannelSender for Outbox {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(
        &self,
        recipient: &Recipient,
        subject: &str,
        message: &str,
    ) -> Result<(), DeliveryError> {
        // Give other tasks a chance to run mid-delivery, like a real transport.
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport {
                channel: ChannelKind::Email,
                message: "relay down".into(),
            });
        }
        self.sent.lock().unwrap().push(Sent {
            to: recipient.name.clone(),
            subject: subject.to_string(),
            body: message.to_string(),
        });
        Ok(())
    }
}

/// Wired facade, sweep and store over a fixed clock.
pub struct Harness {
    pub store: Arc<InMemoryLibrary>,
    pub clock: Arc<FixedClock>,
    pub outbox: Arc<Outbox>,
    pub facade: LoanFacade,
    pub sweep: OverdueSweep,
    pub staff: ActingUser,
}

impl Harness {
    pub async fn new(today: NaiveDate) -> Self {
        let store = Arc::new(InMemoryLibrary::new());
        let clock = Arc::new(FixedClock::new(today));
        let outbox = Arc::new(Outbox::default());
        let stores = LibraryStores::shared(store.clone());

        let facade = LoanFacade::new(stores.clone(), clock.clone());
        let sweep = OverdueSweep::new(stores, outbox.clone(), clock.clone(), LIBRARY);
        let staff = ActingUser(store.add_user("Front desk").await.id);

        Self {
            store,
            clock,
            outbox,
            facade,
            sweep,
            staff,
        }
    }

    pub async fn borrower(&self, name: &str) -> Borrower {
        self.store
            .add_borrower(name, Some("reader@example.com"), Some("+5511999998888"))
            .await
    }

    pub async fn copy(&self, title: &str) -> BookCopy {
        self.store.add_copy(title).await
    }
}
