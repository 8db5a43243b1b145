//! Sweeper lifecycle.
//!
//! The expiry sweeper is an explicit `start()`/`stop()` pair on the
//! manager, invoked once by the hosting application's startup sequence -
//! not an import side effect. `start` is guarded so repeated calls
//! (e.g., under hot reload) never spawn duplicate timers, and `stop`
//! guarantees the interval task is gone, which also gives tests a clean
//! teardown.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::CacheManager;
use crate::metrics::{record_sweep, set_memory_entries};
use crate::storage::memory::MemoryStore;

pub(super) struct Sweeper {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl CacheManager {
    /// Start the periodic expiry sweeper. Idempotent: a second call while
    /// the sweeper is running does nothing.
    pub fn start(&self) {
        let mut guard = self.sweeper.lock();
        if guard.is_some() {
            debug!("sweeper already running");
            return;
        }

        let interval = Duration::from_secs(self.config.sweep_interval_secs);
        let memory = self.memory.clone();
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            run_sweeper(memory, interval, &mut shutdown_rx).await;
        });

        *guard = Some(Sweeper { handle, shutdown });
        info!(interval_secs = interval.as_secs(), "expiry sweeper started");
    }

    /// Stop the sweeper and wait for it to exit. Idempotent.
    pub async fn stop(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(Sweeper { handle, shutdown }) = sweeper {
            let _ = shutdown.send(true);
            let _ = handle.await;
            info!("expiry sweeper stopped");
        }
    }
}

async fn run_sweeper(
    memory: Arc<MemoryStore>,
    interval: Duration,
    shutdown: &mut watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval fires immediately; skip the first tick so the initial
    // sweep lands one full interval after start
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = memory.clean_expired();
                record_sweep(removed);
                set_memory_entries(memory.len());
                if removed > 0 {
                    debug!(removed, "periodic expiry sweep");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
