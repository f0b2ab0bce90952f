use std::sync::Arc;

use bibliotech_core::clock::Clock;
use bibliotech_events::ChannelSender;
use bibliotech_lending::observers::{AuditObserver, NotificationObserver};
use bibliotech_lending::{LibraryStores, LoanFacade, OverdueSweep};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, absent when running over an in-memory store.
    pub pool: Option<bibliotech_db::DbPool>,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Loan lifecycle entry point.
    pub facade: Arc<LoanFacade>,
    /// Overdue sweep, shared with the background job.
    pub sweep: Arc<OverdueSweep>,
}

impl AppState {
    /// Wire the facade and sweep over `stores`.
    ///
    /// The facade gets the audit and notification observers; both the
    /// receipts and the sweep notices go through `notifier`.
    pub fn build(
        config: Arc<ServerConfig>,
        stores: LibraryStores,
        notifier: Arc<dyn ChannelSender>,
        clock: Arc<dyn Clock>,
        pool: Option<bibliotech_db::DbPool>,
    ) -> Self {
        let facade = LoanFacade::new(stores.clone(), Arc::clone(&clock));
        facade.attach(Arc::new(AuditObserver));
        facade.attach(Arc::new(NotificationObserver::new(
            &stores,
            Arc::clone(&notifier),
            config.library_name.clone(),
        )));

        let sweep = OverdueSweep::new(stores, notifier, clock, config.library_name.clone());

        Self {
            pool,
            config,
            facade: Arc::new(facade),
            sweep: Arc::new(sweep),
        }
    }
}
