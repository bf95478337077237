//! # Optional Expiry Sweeper
//!
//! Lazy expiry is authoritative: an expired tender is observed when it
//! is read or answered. Without any readers, though, stale OFFERED
//! tenders stay visible indefinitely — so an optional periodic sweep
//! can be enabled to walk them to EXPIRED through the same coordinator
//! path. The transition contract is unchanged; the sweep merely
//! observes expiry on a timer instead of on demand.

use std::time::Duration;

use crate::orchestration;
use crate::state::AppState;

/// Spawn the periodic sweep task. Returns the task handle; the task
/// runs until the process exits.
pub fn spawn(state: AppState, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it so startup isn't a sweep.
        interval.tick().await;
        tracing::info!(interval_secs, "expiry sweeper running");

        loop {
            interval.tick().await;
            let expired = orchestration::sweep_expired(&state).await;
            if expired > 0 {
                tracing::info!(expired, "expiry sweep pass complete");
            }
        }
    })
}
