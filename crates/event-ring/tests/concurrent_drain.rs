use std::sync::Arc;
use std::thread;
use std::time::Duration;

use harness_core_types::{BrowserEvent, EventCategory, EventKind};
use harness_event_ring::{EventLog, EventRing};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::sleep;

const PRODUCED: i64 = 20_000;

#[test]
fn drain_with_clear_neither_loses_nor_duplicates() {
    let ring = Arc::new(EventRing::new(PRODUCED as usize));

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for ts in 0..PRODUCED {
                ring.record(
                    BrowserEvent::new(EventCategory::Tab, EventKind::Updated, json!(null)).at(ts),
                );
            }
        })
    };

    let mut seen = Vec::with_capacity(PRODUCED as usize);
    while !producer.is_finished() {
        seen.extend(ring.drain(true).into_iter().map(|e| e.timestamp));
    }
    producer.join().unwrap();
    seen.extend(ring.drain(true).into_iter().map(|e| e.timestamp));

    assert_eq!(seen, (0..PRODUCED).collect::<Vec<_>>());
    assert!(ring.is_empty());
}

#[tokio::test]
async fn attach_records_broadcast_events() {
    let log = EventLog::new(100);
    let (tx, rx) = broadcast::channel(16);
    let handle = log.attach(rx);

    tx.send(BrowserEvent::new(EventCategory::Tab, EventKind::Created, json!({ "id": 1 })))
        .unwrap();
    tx.send(BrowserEvent::new(
        EventCategory::Window,
        EventKind::Created,
        json!({ "id": 9 }),
    ))
    .unwrap();

    for _ in 0..50 {
        if log.counts().tabs == 1 && log.counts().windows == 1 {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(log.drain(EventCategory::Tab, false).len(), 1);
    assert_eq!(log.drain(EventCategory::Window, false).len(), 1);

    drop(tx);
    handle.await.unwrap();
}
