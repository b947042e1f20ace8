//! Queue service tests against the simulated backend
//!
//! Clips are URL locators so nothing touches the filesystem; each one
//! finishes after a short tokio timer.

use std::time::Duration;

use cqm_ap::events::{EventBus, QueueEvent};
use cqm_ap::playback::SimulatedBackend;
use cqm_ap::{Error, QueueHandle, QueueService};
use cqm_common::{ChannelId, ClipId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const CLIP_MS: u64 = 20;

fn spawn_service() -> (QueueHandle, JoinHandle<()>, broadcast::Receiver<QueueEvent>) {
    let bus = EventBus::new(256);
    let events = bus.subscribe();
    let backend = SimulatedBackend::new(Duration::from_millis(CLIP_MS));
    let (handle, task) = QueueService::spawn(backend, bus);
    (handle, task, events)
}

/// Wait for the next event matching `pred`, skipping others
async fn next_matching(
    events: &mut broadcast::Receiver<QueueEvent>,
    pred: impl Fn(&QueueEvent) -> bool,
) -> QueueEvent {
    timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.expect("event bus closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn test_clips_finish_in_fifo_order() {
    let (handle, _task, mut events) = spawn_service();

    let a = handle.enqueue_default("https://example.com/a.mp3").await.unwrap();
    let b = handle.enqueue_default("https://example.com/b.mp3").await.unwrap();

    let mut completed: Vec<ClipId> = Vec::new();
    while completed.len() < 2 {
        if let QueueEvent::ClipCompleted {
            clip_id, completed: true, ..
        } = next_matching(&mut events, |e| matches!(e, QueueEvent::ClipCompleted { .. })).await
        {
            completed.push(clip_id);
        }
    }
    assert_eq!(completed, vec![a, b]);

    next_matching(&mut events, |e| {
        matches!(e, QueueEvent::ChannelIdle { channel, .. } if *channel == ChannelId::DEFAULT)
    })
    .await;
    assert_eq!(handle.queue_len(ChannelId::DEFAULT).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_file_is_skipped() {
    let (handle, _task, mut events) = spawn_service();

    let missing = handle
        .enqueue("/no/such/dir/clip.mp3", ChannelId(1))
        .await
        .unwrap();
    let next = handle
        .enqueue("https://example.com/next.mp3", ChannelId(1))
        .await
        .unwrap();

    match next_matching(&mut events, |e| matches!(e, QueueEvent::ClipFailed { .. })).await {
        QueueEvent::ClipFailed { clip_id, .. } => assert_eq!(clip_id, missing),
        other => panic!("Expected ClipFailed, got {:?}", other),
    }
    match next_matching(&mut events, |e| matches!(e, QueueEvent::ClipStarted { .. })).await {
        QueueEvent::ClipStarted { clip_id, .. } => assert_eq!(clip_id, next),
        other => panic!("Expected ClipStarted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stop_channel_cancels_pending_timer() {
    let (handle, _task, mut events) = spawn_service();

    handle
        .enqueue("https://example.com/long.mp3", ChannelId(3))
        .await
        .unwrap();
    handle.stop_channel(ChannelId(3)).await.unwrap();

    // Longer than the clip: a finish would have arrived by now
    tokio::time::sleep(Duration::from_millis(CLIP_MS * 5)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].is_idle());
    assert!(snapshot[0].is_empty());

    let mut natural_completions = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, QueueEvent::ClipCompleted { completed: true, .. }) {
            natural_completions += 1;
        }
    }
    assert_eq!(natural_completions, 0);
}

#[tokio::test]
async fn test_handles_fail_after_shutdown() {
    let (handle, task, _events) = spawn_service();
    let other = handle.clone();

    handle.shutdown().await.unwrap();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

    assert!(matches!(other.stop_all().await, Err(Error::ServiceStopped)));
    assert!(matches!(
        other.enqueue_default("https://example.com/a.mp3").await,
        Err(Error::ServiceStopped)
    ));
}
