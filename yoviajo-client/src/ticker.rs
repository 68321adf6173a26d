use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use yoviajo_core::CountdownDisplay;

/// Recomputes a countdown to `target` on a fixed period.
///
/// Stops by itself once the target has passed; dropping the ticker aborts it.
pub struct CountdownTicker {
    display: watch::Receiver<CountdownDisplay>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    pub fn start(target: DateTime<Utc>, period: Duration) -> Self {
        let period = period.max(crate::admin::MIN_PERIOD);
        let (tx, display) = watch::channel(CountdownDisplay::compute(target, Utc::now()));

        let task = tokio::spawn(async move {
            loop {
                sleep(period).await;
                let next = CountdownDisplay::compute(target, Utc::now());
                if tx.send(next).is_err() || next.is_expired() {
                    break;
                }
            }
        });

        Self { display, task }
    }

    pub fn current(&self) -> CountdownDisplay {
        *self.display.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<CountdownDisplay> {
        self.display.clone()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
