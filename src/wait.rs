//! Polling wait engine.
//!
//! [`wait_for`] re-evaluates an async predicate until it yields a value or the
//! timeout elapses. Predicate errors count as "not yet": they are logged at
//! debug level and polling continues. A timeout is not an error; the caller
//! gets `None`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Shortest interval accepted from remote callers, whose every poll is a
/// WebDriver round trip.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Timeout and polling interval for a single wait, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl WaitOptions {
    pub const fn new(timeout_ms: u64, interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            interval_ms,
        }
    }

    /// Accepts signed values from loosely typed callers; negatives become zero.
    pub fn clamped(timeout_ms: i64, interval_ms: i64) -> Self {
        Self::new(timeout_ms.max(0) as u64, interval_ms.max(0) as u64)
    }

    /// Raises the interval to [`MIN_POLL_INTERVAL_MS`].
    pub fn with_min_interval(mut self) -> Self {
        self.interval_ms = self.interval_ms.max(MIN_POLL_INTERVAL_MS);
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(5_000, 100)
    }
}

/// Per-waiter defaults, overridable from the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitDefaults {
    pub tab_url: WaitOptions,
    pub tab_load: WaitOptions,
    pub event: WaitOptions,
    pub count: WaitOptions,
    pub condition: WaitOptions,
    /// Pause between the two observations a count wait needs to agree on.
    pub count_settle_ms: u64,
}

impl Default for WaitDefaults {
    fn default() -> Self {
        Self {
            tab_url: WaitOptions::new(10_000, 500),
            tab_load: WaitOptions::new(10_000, 250),
            event: WaitOptions::new(5_000, 100),
            count: WaitOptions::new(5_000, 250),
            condition: WaitOptions::default(),
            count_settle_ms: 500,
        }
    }
}

impl WaitDefaults {
    pub fn count_settle(&self) -> Duration {
        Duration::from_millis(self.count_settle_ms)
    }
}

/// Polls `predicate` until it returns `Ok(Some(_))` or `options.timeout`
/// elapses.
///
/// The predicate runs at least once, so a zero timeout means a single poll.
/// No sleep overshoots the deadline.
pub async fn wait_for<T, E, F, Fut>(mut predicate: F, options: WaitOptions) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: fmt::Display,
{
    let timeout = options.timeout();
    let interval = options.interval();
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match predicate().await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(err) => {
                debug!(target: "wait", attempt, error = %err, "predicate failed; polling again");
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            debug!(target: "wait", attempt, ?timeout, "wait timed out");
            return None;
        }

        let pause = interval.min(timeout - elapsed);
        if pause.is_zero() {
            tokio::task::yield_now().await;
        } else {
            sleep(pause).await;
        }
    }
}

/// Waits until `fetch` returns exactly `target` items on two observations
/// `settle` apart, and returns the second observation.
///
/// Counts of tabs and windows flicker while the browser opens or closes
/// them, so a single matching snapshot is not trusted.
pub async fn wait_for_settled_len<T, E, F, Fut>(
    fetch: F,
    target: usize,
    settle: Duration,
    options: WaitOptions,
) -> Option<Vec<T>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: fmt::Display,
{
    let fetch = &fetch;
    wait_for(
        move || async move {
            if fetch().await?.len() != target {
                return Ok(None);
            }
            sleep(settle).await;
            let confirmed = fetch().await?;
            Ok::<_, E>((confirmed.len() == target).then_some(confirmed))
        },
        options,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_value_from_kth_poll() {
        let calls = AtomicUsize::new(0);
        let found = wait_for(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, String>((n == 4).then(|| format!("poll-{n}")))
            },
            WaitOptions::new(1_000, 5),
        )
        .await;
        assert_eq!(found.as_deref(), Some("poll-4"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn counter_reaches_threshold() {
        let mut counter = 0;
        let found = wait_for(
            || {
                let hit = counter >= 3;
                counter += 1;
                async move { Ok::<_, String>(hit.then_some("done")) }
            },
            WaitOptions::new(1_000, 5),
        )
        .await;
        assert_eq!(found, Some("done"));
    }

    #[tokio::test]
    async fn errors_are_treated_as_not_yet() {
        let calls = AtomicUsize::new(0);
        let found = wait_for(
            || async {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err("relay not reachable"),
                    _ => Ok(Some(7)),
                }
            },
            WaitOptions::new(1_000, 5),
        )
        .await;
        assert_eq!(found, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_within_one_interval() {
        let started = std::time::Instant::now();
        let found = wait_for(
            || async { Ok::<Option<()>, String>(None) },
            WaitOptions::new(120, 50),
        )
        .await;
        let elapsed = started.elapsed();
        assert!(found.is_none());
        assert!(elapsed >= Duration::from_millis(120), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(120 + 50 + 100), "{elapsed:?}");
    }

    #[tokio::test]
    async fn zero_timeout_polls_once() {
        let calls = AtomicUsize::new(0);
        let found = wait_for(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<()>, String>(None)
            },
            WaitOptions::clamped(-5, 100),
        )
        .await;
        assert!(found.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn settled_len_rejects_transient_match() {
        // 3 items on the first look, 2 after settling, then 3 for good.
        let script = Arc::new(AtomicUsize::new(0));
        let found = wait_for_settled_len(
            || {
                let script = script.clone();
                async move {
                    let len = match script.fetch_add(1, Ordering::SeqCst) {
                        0 => 3,
                        1 => 2,
                        _ => 3,
                    };
                    Ok::<_, String>(vec![(); len])
                }
            },
            3,
            Duration::from_millis(5),
            WaitOptions::new(1_000, 5),
        )
        .await;
        assert_eq!(found.map(|items| items.len()), Some(3));
        assert!(script.load(Ordering::SeqCst) >= 4);
    }

    #[test]
    fn defaults_match_waiter_table() {
        let defaults = WaitDefaults::default();
        assert_eq!(defaults.tab_url, WaitOptions::new(10_000, 500));
        assert_eq!(defaults.tab_load, WaitOptions::new(10_000, 250));
        assert_eq!(defaults.event, WaitOptions::new(5_000, 100));
        assert_eq!(defaults.count, WaitOptions::new(5_000, 250));
        assert_eq!(defaults.count_settle(), Duration::from_millis(500));
    }
}
