use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::harness::Harness;

const MIN_PERIOD: Duration = Duration::from_millis(10);

impl Harness {
    /// Periodically moves events buffered inside the extension into the
    /// local log until `shutdown` fires. Event reads stop pulling on their
    /// own while the feed runs.
    pub fn spawn_remote_feed(
        self: &Arc<Self>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        self.running_feeds.fetch_add(1, Ordering::AcqRel);
        let running = FeedRunning(Arc::clone(self));
        tokio::spawn(remote_feed(running, every, shutdown))
    }
}

/// Marks a feed as running until dropped, including when the task is aborted.
struct FeedRunning(Arc<Harness>);

impl Drop for FeedRunning {
    fn drop(&mut self) {
        self.0.running_feeds.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn remote_feed(running: FeedRunning, every: Duration, shutdown: CancellationToken) {
    let harness = &running.0;
    let mut ticker = interval(every.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(target: "feed", period_ms = every.as_millis() as u64, "remote event feed started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(err) = harness.pull_remote_events().await {
                    debug!(target: "feed", error = %err, "remote event pull failed");
                }
            }
        }
    }
    info!(target: "feed", "remote event feed stopped");
}
