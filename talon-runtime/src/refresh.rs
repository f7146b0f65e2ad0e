//! Periodic store refresh
//!
//! Re-runs the load protocol on a fixed cadence, replacing the store when
//! the fetch completes. A search issued while a refresh is in flight sees
//! the previous snapshot.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::SharedSession;

/// Spawn the refresh loop for a session. Returns the task handle; abort
/// or drop it to stop refreshing.
pub fn spawn_refresh(session: SharedSession, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick resolves immediately; the initial load already ran
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!("Refreshing IOC store");
            if let Err(e) = session.reload().await {
                warn!("Refresh failed, keeping previous store: {}", e);
            }
        }
    })
}
