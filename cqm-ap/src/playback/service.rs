//! Queue service
//!
//! Runs a [`ChannelQueueManager`] on its own tokio task. Callers talk to it
//! through a cloneable [`QueueHandle`]; playback primitives talk to it
//! through clip notifications. The task is the only code touching the
//! manager, so every queue mutation happens on one logical thread.

use std::ops::ControlFlow;

use cqm_common::{ChannelId, ClipId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::clip::PlaybackBackend;
use super::manager::ChannelQueueManager;
use crate::error::{Error, Result};
use crate::events::{ChannelSnapshot, ClipEvent, EventBus};

/// Command channel depth
const COMMAND_CAPACITY: usize = 32;

/// Requests from [`QueueHandle`] to the service task
#[derive(Debug)]
enum Command {
    Enqueue {
        locator: String,
        channel: ChannelId,
        reply: oneshot::Sender<ClipId>,
    },
    StopCurrent {
        channel: ChannelId,
        reply: oneshot::Sender<()>,
    },
    StopChannel {
        channel: ChannelId,
        reply: oneshot::Sender<()>,
    },
    StopAll {
        reply: oneshot::Sender<()>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    QueueLen {
        channel: ChannelId,
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<ChannelSnapshot>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Background task owning the channel registry
pub struct QueueService;

impl QueueService {
    /// Spawn the service on the current tokio runtime
    ///
    /// The task ends after [`QueueHandle::shutdown`] or once every handle is
    /// dropped; either way all channels are stopped first.
    pub fn spawn(
        backend: impl PlaybackBackend + 'static,
        event_bus: EventBus,
    ) -> (QueueHandle, JoinHandle<()>) {
        let (manager, clip_rx) = ChannelQueueManager::new(backend, event_bus);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let task = tokio::spawn(run(manager, cmd_rx, clip_rx));
        (QueueHandle { tx: cmd_tx }, task)
    }
}

async fn run(
    mut manager: ChannelQueueManager,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut clip_rx: mpsc::UnboundedReceiver<ClipEvent>,
) {
    info!("Queue service started");

    loop {
        tokio::select! {
            // Notifications first: a clip that finished before a command was
            // sent is accounted for before that command runs.
            biased;

            Some(event) = clip_rx.recv() => manager.handle_clip_event(event),

            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => {
                    if dispatch(&mut manager, cmd).is_break() {
                        break;
                    }
                }
                None => {
                    debug!("All queue handles dropped");
                    manager.stop_all();
                    break;
                }
            },
        }
    }

    info!("Queue service stopped");
}

fn dispatch(manager: &mut ChannelQueueManager, cmd: Command) -> ControlFlow<()> {
    // Reply errors mean the caller stopped waiting; the command still ran
    match cmd {
        Command::Enqueue {
            locator,
            channel,
            reply,
        } => {
            let _ = reply.send(manager.enqueue(&locator, channel));
        }
        Command::StopCurrent { channel, reply } => {
            manager.stop_current(channel);
            let _ = reply.send(());
        }
        Command::StopChannel { channel, reply } => {
            manager.stop_channel(channel);
            let _ = reply.send(());
        }
        Command::StopAll { reply } => {
            manager.stop_all();
            let _ = reply.send(());
        }
        Command::Reset { reply } => {
            manager.reset();
            let _ = reply.send(());
        }
        Command::QueueLen { channel, reply } => {
            let _ = reply.send(manager.queue_len(channel));
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(manager.snapshot_all());
        }
        Command::Shutdown { reply } => {
            manager.stop_all();
            let _ = reply.send(());
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Cloneable handle to a running [`QueueService`]
///
/// Every method waits for the service to apply the request, so the queue
/// state seen afterwards already reflects it.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<Command>,
}

impl QueueHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::ServiceStopped)?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Append a clip to `channel`
    ///
    /// Resolves once the clip is queued and, if it landed at the head,
    /// `start()` has been called. Does not wait for the clip to finish.
    pub async fn enqueue(&self, locator: impl Into<String>, channel: ChannelId) -> Result<ClipId> {
        let locator = locator.into();
        self.request(|reply| Command::Enqueue {
            locator,
            channel,
            reply,
        })
        .await
    }

    /// [`enqueue`](Self::enqueue) on [`ChannelId::DEFAULT`]
    pub async fn enqueue_default(&self, locator: impl Into<String>) -> Result<ClipId> {
        self.enqueue(locator, ChannelId::DEFAULT).await
    }

    /// Skip the active clip of `channel`; the next one starts immediately
    pub async fn stop_current(&self, channel: ChannelId) -> Result<()> {
        self.request(|reply| Command::StopCurrent { channel, reply })
            .await
    }

    /// [`stop_current`](Self::stop_current) on [`ChannelId::DEFAULT`]
    pub async fn stop_current_default(&self) -> Result<()> {
        self.stop_current(ChannelId::DEFAULT).await
    }

    /// Cancel the active clip of `channel` and drop everything queued
    pub async fn stop_channel(&self, channel: ChannelId) -> Result<()> {
        self.request(|reply| Command::StopChannel { channel, reply })
            .await
    }

    /// [`stop_channel`](Self::stop_channel) on [`ChannelId::DEFAULT`]
    pub async fn stop_channel_default(&self) -> Result<()> {
        self.stop_channel(ChannelId::DEFAULT).await
    }

    /// Stop every channel
    pub async fn stop_all(&self) -> Result<()> {
        self.request(|reply| Command::StopAll { reply }).await
    }

    /// Stop every channel and forget them
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Entries in `channel`, active clip included; 0 for unknown channels
    pub async fn queue_len(&self, channel: ChannelId) -> Result<usize> {
        self.request(|reply| Command::QueueLen { channel, reply })
            .await
    }

    /// Snapshots of every channel, ordered by channel id
    pub async fn snapshot(&self) -> Result<Vec<ChannelSnapshot>> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop all channels and end the service task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
