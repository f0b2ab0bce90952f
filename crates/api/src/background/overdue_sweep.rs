//! Periodic overdue sweep.
//!
//! Runs [`OverdueSweep`] on a fixed `tokio::time::interval`. The sweep's
//! once-per-day guard makes repeated runs within a day cheap, so the
//! interval can be much shorter than a day.

use std::sync::Arc;
use std::time::Duration;

use bibliotech_lending::OverdueSweep;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop until `cancel` is triggered.
///
/// The first run happens immediately. Errors are logged and the loop keeps
/// going.
pub async fn run(sweep: Arc<OverdueSweep>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Overdue sweep job started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Overdue sweep job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep.run_report().await {
                    Ok(report) if report.unnotified.is_empty() => {
                        tracing::debug!(
                            transitioned = report.transitioned,
                            notified = report.notified,
                            "Overdue sweep: run complete"
                        );
                    }
                    Ok(report) => {
                        tracing::warn!(
                            unnotified = report.unnotified.len(),
                            "Overdue sweep: some notices were not delivered"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Overdue sweep: run failed");
                    }
                }
            }
        }
    }
}
