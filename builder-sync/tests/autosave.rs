//! Auto-save timing tests.
//!
//! Run on a paused tokio clock, so the debounce window is exact and the
//! tests take no wall-clock time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use builder_sync::{AutoSaver, SaveEvent};
use common::pages::MemoryPages;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};

const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Drain every event currently buffered.
fn drain(events: &mut broadcast::Receiver<SaveEvent>) -> Vec<SaveEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_three_quick_edits_save_once_with_last_value() {
    let api = Arc::new(MemoryPages::default());
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);
    let mut events = saver.subscribe();

    saver.notify("one".into());
    sleep(Duration::from_millis(300)).await;
    saver.notify("two".into());
    sleep(Duration::from_millis(300)).await;
    saver.notify("three".into());
    let last_edit = Instant::now();

    loop {
        match events.recv().await.expect("event") {
            SaveEvent::Saved { generation } => {
                assert_eq!(generation, 1);
                break;
            }
            SaveEvent::Saving { .. } => {}
            SaveEvent::Failed { error, .. } => panic!("save failed: {error}"),
        }
    }
    assert!(last_edit.elapsed() >= DEBOUNCE);
    assert_eq!(api.saved(), vec!["three".to_string()]);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.saved().len(), 1);
    assert_eq!(saver.latest_generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edits_spread_out_save_separately() {
    let api = Arc::new(MemoryPages::default());
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);

    saver.notify("first".into());
    sleep(Duration::from_millis(1500)).await;
    saver.notify("second".into());
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(api.saved(), vec!["first".to_string(), "second".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_save_never_reports_saved() {
    let api = Arc::new(
        MemoryPages::default().with_save_delays(&[Duration::from_secs(5), Duration::ZERO]),
    );
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);
    let mut events = saver.subscribe();

    saver.notify("old".into());
    sleep(Duration::from_millis(1100)).await;
    saver.notify("new".into());
    sleep(Duration::from_millis(1100)).await;
    // Let the slow first save finish.
    sleep(Duration::from_secs(10)).await;

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            SaveEvent::Saving { generation: 1 },
            SaveEvent::Saving { generation: 2 },
            SaveEvent::Saved { generation: 2 },
        ]
    );
    assert_eq!(api.saved(), vec!["old".to_string(), "new".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_saves_immediately() {
    let api = Arc::new(MemoryPages::default());
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);

    saver.notify("now".into());
    saver.flush();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(api.saved(), vec!["now".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_pending_and_silences_in_flight() {
    let api = Arc::new(MemoryPages::default().with_save_delays(&[Duration::from_secs(2)]));
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);
    let mut events = saver.subscribe();

    saver.notify("in flight".into());
    sleep(Duration::from_millis(1100)).await;
    saver.notify("never saved".into());
    saver.shutdown().await;

    sleep(Duration::from_secs(5)).await;
    assert_eq!(api.saved(), vec!["in flight".to_string()]);
    assert_eq!(drain(&mut events), vec![SaveEvent::Saving { generation: 1 }]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_retries_failed_save() {
    let api = Arc::new(MemoryPages::default().with_save_failures(1));
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);
    let mut events = saver.subscribe();

    saver.notify("draft".into());
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(
        drain(&mut events),
        vec![
            SaveEvent::Saving { generation: 1 },
            SaveEvent::Failed {
                generation: 1,
                error: "Pages API rejected the request: store unavailable".into(),
            },
        ]
    );

    saver.flush();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(api.saved(), vec!["draft".to_string(), "draft".to_string()]);
    assert_eq!(
        drain(&mut events),
        vec![
            SaveEvent::Saving { generation: 2 },
            SaveEvent::Saved { generation: 2 },
        ]
    );

    // Nothing left to retry.
    saver.flush();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(api.saved().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_flush_queued_before_shutdown_is_discarded() {
    let api = Arc::new(MemoryPages::default());
    let saver = AutoSaver::spawn(api.clone(), "1", DEBOUNCE);
    let mut events = saver.subscribe();

    saver.notify("leaving".into());
    saver.flush();
    saver.shutdown().await;

    sleep(Duration::from_secs(5)).await;
    assert!(api.saved().is_empty());
    assert!(drain(&mut events).is_empty());
}
