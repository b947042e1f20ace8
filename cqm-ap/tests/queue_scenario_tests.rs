//! Channel queue scenarios
//!
//! Drives `ChannelQueueManager` synchronously with the recording backend:
//! the test decides when each clip finishes, then drains notifications.

use cqm_ap::events::{ClipEvent, EventBus, QueueChangeTrigger, QueueEvent};
use cqm_ap::playback::{ChannelQueueManager, RecordingBackend};
use cqm_common::ChannelId;
use tokio::sync::{broadcast, mpsc};

struct Harness {
    manager: ChannelQueueManager,
    clip_rx: mpsc::UnboundedReceiver<ClipEvent>,
    backend: RecordingBackend,
    events: broadcast::Receiver<QueueEvent>,
}

impl Harness {
    fn new() -> Self {
        let backend = RecordingBackend::new();
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let (manager, clip_rx) = ChannelQueueManager::new(backend.clone(), bus);
        Self {
            manager,
            clip_rx,
            backend,
            events,
        }
    }

    /// Report natural completion for `locator` and let the manager react
    fn finish(&mut self, locator: &str) {
        assert!(self.backend.finish(locator), "{} holds no notifier", locator);
        self.manager.drain_clip_events(&mut self.clip_rx);
    }

    fn drain_events(&mut self) -> Vec<QueueEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

#[test]
fn test_default_channel_plays_in_order() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("b.mp3", ChannelId::DEFAULT);
    assert_eq!(h.backend.start_order(), vec!["a.mp3"]);

    h.finish("a.mp3");
    assert_eq!(h.backend.start_order(), vec!["a.mp3", "b.mp3"]);

    h.finish("b.mp3");
    assert_eq!(h.manager.queue_len(ChannelId::DEFAULT), 0);
    assert!(!h.manager.is_playing(ChannelId::DEFAULT));
    assert_eq!(h.backend.start_count("a.mp3"), 1);
    assert_eq!(h.backend.start_count("b.mp3"), 1);
}

#[test]
fn test_channels_play_concurrently() {
    let mut h = Harness::new();

    h.manager.enqueue("x.mp3", ChannelId(1));
    h.manager.enqueue("y.mp3", ChannelId(2));

    let mut playing = h.backend.playing();
    playing.sort();
    assert_eq!(playing, vec!["x.mp3", "y.mp3"]);
}

#[test]
fn test_stop_current_then_next_starts() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("b.mp3", ChannelId::DEFAULT);
    h.manager.stop_current(ChannelId::DEFAULT);

    assert_eq!(h.backend.cancel_count("a.mp3"), 1);
    assert_eq!(h.backend.playing(), vec!["b.mp3"]);
    assert_eq!(h.manager.queue_len(ChannelId::DEFAULT), 1);
}

#[test]
fn test_late_finish_after_stop_is_ignored() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("b.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("c.mp3", ChannelId::DEFAULT);
    h.manager.stop_current(ChannelId::DEFAULT);

    // Cancelled primitive fires anyway
    h.finish("a.mp3");

    assert_eq!(h.backend.start_order(), vec!["a.mp3", "b.mp3"]);
    assert_eq!(h.manager.queue_len(ChannelId::DEFAULT), 2);
    assert_eq!(h.backend.playing(), vec!["b.mp3"]);
}

#[test]
fn test_stop_all_without_channels_is_noop() {
    let mut h = Harness::new();

    h.manager.stop_all();

    assert!(h.manager.channel_ids().is_empty());
    assert!(h.drain_events().is_empty());
}

#[test]
fn test_stop_channel_leaves_other_channels_alone() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId(1));
    h.manager.enqueue("b.mp3", ChannelId(1));
    h.manager.enqueue("c.mp3", ChannelId(2));

    h.manager.stop_channel(ChannelId(1));

    assert_eq!(h.manager.queue_len(ChannelId(1)), 0);
    assert_eq!(h.manager.queue_len(ChannelId(2)), 1);
    assert_eq!(h.backend.playing(), vec!["c.mp3"]);
    assert_eq!(h.backend.start_count("b.mp3"), 0);
}

#[test]
fn test_stop_all_empties_every_channel() {
    let mut h = Harness::new();

    for channel in 0..4 {
        h.manager.enqueue("loop.mp3", ChannelId(channel));
        h.manager.enqueue("tail.mp3", ChannelId(channel));
    }

    h.manager.stop_all();

    for channel in 0..4 {
        assert_eq!(h.manager.queue_len(ChannelId(channel)), 0);
        assert!(!h.manager.is_playing(ChannelId(channel)));
    }
    assert_eq!(h.backend.cancel_count("loop.mp3"), 4);
    assert!(h.backend.playing().is_empty());

    // Nothing restarts when the cancelled clips report late
    while h.backend.finish("loop.mp3") {}
    h.manager.drain_clip_events(&mut h.clip_rx);
    assert_eq!(h.backend.start_count("tail.mp3"), 0);
}

#[test]
fn test_stop_all_with_drained_and_playing_channels() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId(1));
    h.finish("a.mp3");
    h.manager.enqueue("b.mp3", ChannelId(2));
    h.manager.enqueue("c.mp3", ChannelId(2));
    h.drain_events();

    h.manager.stop_all();

    assert_eq!(h.manager.channel_ids(), vec![ChannelId(1), ChannelId(2)]);
    assert_eq!(h.manager.queue_len(ChannelId(1)), 0);
    assert_eq!(h.manager.queue_len(ChannelId(2)), 0);
    assert_eq!(h.backend.cancel_count("a.mp3"), 0);
    assert_eq!(h.backend.cancel_count("b.mp3"), 1);
    assert_eq!(h.backend.start_count("c.mp3"), 0);
    assert!(h.backend.playing().is_empty());

    // The already drained channel produces no stop events
    let events = h.drain_events();
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.channel() == ChannelId(2)));
    assert!(events.iter().any(|e| matches!(
        e,
        QueueEvent::ClipCompleted { completed: false, .. }
    )));
}

#[test]
fn test_failed_clip_does_not_block_channel() {
    let mut h = Harness::new();

    h.manager.enqueue("missing.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("b.mp3", ChannelId::DEFAULT);
    assert!(h.backend.fail("missing.mp3", "file not found"));
    h.manager.drain_clip_events(&mut h.clip_rx);

    assert_eq!(h.backend.playing(), vec!["b.mp3"]);
    let failed = h
        .drain_events()
        .into_iter()
        .any(|e| matches!(e, QueueEvent::ClipFailed { ref reason, .. } if reason == "file not found"));
    assert!(failed);
}

#[test]
fn test_unstartable_clips_are_skipped() {
    let mut h = Harness::new();
    h.backend.fail_start("bad.mp3");

    h.manager.enqueue("bad.mp3", ChannelId::DEFAULT);
    assert_eq!(h.manager.queue_len(ChannelId::DEFAULT), 0);

    h.manager.enqueue("good.mp3", ChannelId::DEFAULT);
    assert_eq!(h.backend.playing(), vec!["good.mp3"]);
}

#[test]
fn test_queue_changed_triggers() {
    let mut h = Harness::new();

    h.manager.enqueue("a.mp3", ChannelId::DEFAULT);
    h.manager.enqueue("b.mp3", ChannelId::DEFAULT);
    h.manager.stop_current(ChannelId::DEFAULT);
    h.finish("b.mp3");
    h.manager.enqueue("c.mp3", ChannelId::DEFAULT);
    h.manager.stop_channel(ChannelId::DEFAULT);

    let triggers: Vec<QueueChangeTrigger> = h
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            QueueEvent::QueueChanged { trigger, .. } => Some(trigger),
            _ => None,
        })
        .collect();

    assert_eq!(
        triggers,
        vec![
            QueueChangeTrigger::Enqueue,
            QueueChangeTrigger::Enqueue,
            QueueChangeTrigger::StopCurrent,
            QueueChangeTrigger::Completion,
            QueueChangeTrigger::Enqueue,
            QueueChangeTrigger::StopChannel,
        ]
    );
}
