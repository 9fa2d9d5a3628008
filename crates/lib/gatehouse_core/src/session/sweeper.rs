//! Background sweeping.
//!
//! Request-driven sweeps stop when traffic stops; a sweeper task keeps idle
//! sessions from lingering on a quiet server.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::SessionStore;

/// Lower bound on the tick period.
const MIN_TICK: Duration = Duration::from_millis(100);

impl SessionStore {
    /// Spawn a task that calls [`sweep_now`](Self::sweep_now) periodically.
    ///
    /// Ticks at half the control interval so that every interval boundary
    /// is observed; the store's own rate limit still caps the scan rate.
    /// Abort the returned handle to stop it.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let period = tick_period(store.config().control_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Some(evicted) = store.sweep_now() {
                    debug!(evicted, "background sweep");
                }
            }
        })
    }
}

/// Half the control interval, floored at [`MIN_TICK`].
fn tick_period(control_interval: chrono::Duration) -> Duration {
    (control_interval / 2)
        .to_std()
        .unwrap_or(MIN_TICK)
        .max(MIN_TICK)
}
