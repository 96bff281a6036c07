//! Bounded, per-category log of tab and window lifecycle events.
//!
//! Producers (browser listeners, a relay feed, a broadcast subscription) call
//! [`EventLog::record`]; consumers snapshot with [`EventLog::drain`]. Each ring
//! keeps at most `capacity` events and evicts the oldest first.

use std::collections::VecDeque;
use std::sync::Arc;

use harness_core_types::{BrowserEvent, EventCategory};
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity used when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug)]
struct BoundedRing<T> {
    capacity: usize,
    data: VecDeque<T>,
}

impl<T> BoundedRing<T> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, item: T) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    fn take(&mut self) -> Vec<T> {
        self.data.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

impl<T: Clone> BoundedRing<T> {
    fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}

/// Fixed-capacity FIFO of events for a single category.
#[derive(Debug)]
pub struct EventRing {
    inner: Mutex<BoundedRing<BrowserEvent>>,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedRing::new(capacity)),
        }
    }

    pub fn record(&self, event: BrowserEvent) {
        self.inner.lock().push(event);
    }

    /// Returns the buffered events oldest first. With `clear` the ring is
    /// emptied under the same lock, so nothing recorded concurrently is lost
    /// or returned twice.
    pub fn drain(&self, clear: bool) -> Vec<BrowserEvent> {
        let mut guard = self.inner.lock();
        if clear {
            guard.take()
        } else {
            guard.snapshot()
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

impl Default for EventRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Tab and window rings, constructed once and shared by handle.
#[derive(Debug)]
pub struct EventLog {
    tabs: EventRing,
    windows: EventRing,
}

impl EventLog {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            tabs: EventRing::new(capacity),
            windows: EventRing::new(capacity),
        })
    }

    pub fn ring(&self, category: EventCategory) -> &EventRing {
        match category {
            EventCategory::Tab => &self.tabs,
            EventCategory::Window => &self.windows,
        }
    }

    pub fn record(&self, event: BrowserEvent) {
        self.ring(event.category).record(event);
    }

    pub fn record_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = BrowserEvent>,
    {
        for event in events {
            self.record(event);
        }
    }

    pub fn drain(&self, category: EventCategory, clear: bool) -> Vec<BrowserEvent> {
        self.ring(category).drain(clear)
    }

    pub fn clear_all(&self) {
        self.tabs.drain(true);
        self.windows.drain(true);
    }

    pub fn counts(&self) -> EventCounts {
        EventCounts {
            tabs: self.tabs.len(),
            windows: self.windows.len(),
        }
    }

    /// Records every event published on `rx` until the sender side is dropped.
    pub fn attach(self: &Arc<Self>, mut rx: broadcast::Receiver<BrowserEvent>) -> JoinHandle<()> {
        let log = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => log.record(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "event-ring", skipped, "event subscription lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!(target: "event-ring", "event source closed");
                        break;
                    }
                }
            }
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EventCounts {
    pub tabs: usize,
    pub windows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core_types::EventKind;
    use serde_json::json;

    fn tab_event(ts: i64) -> BrowserEvent {
        BrowserEvent::new(EventCategory::Tab, EventKind::Created, json!({ "id": ts })).at(ts)
    }

    #[test]
    fn bounded_ring_evicts_oldest() {
        let mut ring = BoundedRing::new(2);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        assert_eq!(ring.snapshot(), vec![2, 3]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let ring = EventRing::new(0);
        ring.record(tab_event(1));
        ring.record(tab_event(2));
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.drain(false)[0].timestamp, 2);
    }

    #[test]
    fn keeps_last_hundred_of_one_hundred_fifty() {
        let ring = EventRing::new(100);
        for ts in 1..=150 {
            ring.record(tab_event(ts));
        }
        let events = ring.drain(false);
        assert_eq!(events.len(), 100);
        let stamps: Vec<i64> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, (51..=150).collect::<Vec<_>>());
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let ring = EventRing::new(5);
        for ts in 0..37 {
            ring.record(tab_event(ts));
            assert!(ring.len() <= 5);
            let stamps: Vec<i64> = ring.drain(false).iter().map(|e| e.timestamp).collect();
            let first = (ts - 4).max(0);
            assert_eq!(stamps, (first..=ts).collect::<Vec<_>>());
        }
    }

    #[test]
    fn drain_clear_then_snapshot_is_empty() {
        let ring = EventRing::default();
        ring.record(tab_event(1));
        ring.record(tab_event(2));
        assert_eq!(ring.drain(true).len(), 2);
        assert!(ring.drain(false).is_empty());
        assert!(ring.is_empty());
    }

    #[test]
    fn log_routes_by_category() {
        let log = EventLog::new(10);
        log.record(tab_event(1));
        log.record(BrowserEvent::new(
            EventCategory::Window,
            EventKind::Removed,
            json!({ "windowId": 4 }),
        ));
        assert_eq!(log.counts(), EventCounts { tabs: 1, windows: 1 });
        assert_eq!(log.drain(EventCategory::Window, false)[0].kind, EventKind::Removed);
        log.clear_all();
        assert_eq!(log.counts(), EventCounts::default());
    }
}
