//! Expiry Sweeper Task
//!
//! Background task that periodically drops expired buckets from the memory store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryHashStore;

/// Spawns a background task that periodically purges expired buckets.
///
/// Redis expires keys on its own; only the in-process store needs this.
///
/// # Arguments
/// * `store` - Shared memory store
/// * `interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted on context shutdown.
pub fn spawn_expiry_sweeper(store: Arc<MemoryHashStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting bucket expiry sweeper with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired buckets", removed);
            } else {
                debug!("Expiry sweep: no expired buckets found");
            }
        }
    })
}
