//! Periodic low-stock sweep.
//!
//! Every tick, products with `quantity < threshold` that have not been
//! flagged yet are batched into one alert email and then flagged, so each
//! depletion episode alerts exactly once. The flag is cleared only by an
//! administrative restock back over the threshold. The sweep shares the
//! pool with live traffic without locking; a decrement landing mid-sweep
//! is picked up on the next tick.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

use crate::db::products::ProductRepository;
use crate::services::templates::low_stock_alert_email;
use crate::state::AppState;

/// Errors from one sweep run.
#[derive(Debug, thiserror::Error)]
enum SweepError {
    #[error(transparent)]
    Repository(#[from] crate::db::RepositoryError),
    #[error(transparent)]
    Mailer(#[from] crate::services::mailer::MailerError),
}

/// Spawn the background sweep loop.
pub fn spawn_low_stock_sweep(state: AppState) {
    let period = Duration::from_secs(state.config().low_stock.sweep_interval_secs);
    info!(period_secs = period.as_secs(), "Spawning low-stock sweep");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = run_sweep(&state).await {
                error!(error = %e, "Low-stock sweep failed");
            }
        }
    });
}

/// One sweep: find, alert, flag.
#[instrument(skip_all)]
async fn run_sweep(state: &AppState) -> Result<(), SweepError> {
    let threshold = state.config().low_stock.threshold;
    let repo = ProductRepository::new(state.pool());

    let products = repo.find_low_stock_unnotified(threshold).await?;
    if products.is_empty() {
        return Ok(());
    }

    let recipient = state.mailer().from_email().to_owned();
    state
        .mailer()
        .send(
            &recipient,
            "Low Stock Products Alert",
            &low_stock_alert_email(&products),
        )
        .await?;

    // Flag exactly the products included in this alert
    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    repo.mark_low_stock_notified(&ids).await?;

    info!(count = products.len(), "Low-stock alert sent and flags set");
    Ok(())
}
