use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use yoviajo_core::payloads::AdminStats;

use crate::api::ApiClient;

/// Floor for the tick period; a zero period would spawn fetches back to back.
pub const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Periodically refreshes admin statistics.
///
/// Fetches once immediately, then on every period. Each tick runs as its own
/// task, so a slow response can overlap the next tick. Dropping the poller
/// stops further ticks.
pub struct StatsPoller {
    latest: watch::Receiver<Option<AdminStats>>,
    task: JoinHandle<()>,
}

impl StatsPoller {
    pub fn start(api: ApiClient, period: Duration) -> Self {
        let period = period.max(MIN_PERIOD);
        let (tx, latest) = watch::channel(None);
        let tx = Arc::new(tx);

        let task = tokio::spawn(async move {
            info!("Admin stats poller started, every {:?}", period);
            loop {
                let api = api.clone();
                let tx = Arc::clone(&tx);
                tokio::spawn(async move {
                    match api.admin_stats().await {
                        Ok(stats) => {
                            debug!("Admin stats: {} users, {} active rides", stats.total_users, stats.active_rides);
                            let _ = tx.send(Some(stats));
                        }
                        Err(e) => warn!("Admin stats refresh failed: {}", e),
                    }
                });
                sleep(period).await;
            }
        });

        Self { latest, task }
    }

    /// Most recent successful fetch, if any.
    pub fn latest(&self) -> Option<AdminStats> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AdminStats>> {
        self.latest.clone()
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
