//! The two recurring poll loops. Each is a plain async function so the
//! production coroutines and the tests drive the same code; only the
//! period differs.

use std::time::Duration;

use api::ChainClient;
use dioxus_logger::tracing::info;

use super::controller::SaleController;
use crate::compat;

/// Production period for both loops.
pub const POLL_PERIOD: Duration = Duration::from_secs(5);

/// Re-resolves the sale phase every period. Once the restricted window is
/// observed closed the outcome is permanent for the session, so the loop
/// deregisters itself by returning instead of carrying a handle to its own
/// timer.
pub async fn run_sale_status_loop<C: ChainClient>(
    controller: SaleController<C>,
    period: Duration,
) {
    let mut interval = compat::interval::Interval::new(period);
    loop {
        interval.tick().await;
        if controller.resolve_sale_started().await && controller.resolve_sale_ended().await {
            info!("presale window closed; sale-status polling stops");
            return;
        }
    }
}

/// Refreshes the issued-token counter every period, for the life of the
/// session. Issuance stays interesting after the sale closes, so nothing
/// terminates this loop but view teardown.
pub async fn run_minted_count_loop<C: ChainClient>(
    controller: SaleController<C>,
    period: Duration,
) {
    let mut interval = compat::interval::Interval::new(period);
    loop {
        interval.tick().await;
        controller.resolve_minted_count().await;
    }
}
