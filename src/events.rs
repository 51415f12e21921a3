//! In-process profile change feed.
//!
//! Handlers publish a [`ProfileChange`] after every successful write; consumers
//! subscribe by profile owner and receive each change through a callback. The
//! feed is ephemeral: a subscriber that is not connected when a change happens
//! simply misses it and sees fresh data on its next read.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::models::ProfileChange;

/// Events a subscriber may fall behind by before it starts skipping.
pub const CHANNEL_CAPACITY: usize = 16;

type Channels = Mutex<HashMap<Uuid, Channel>>;

struct Channel {
    sender: broadcast::Sender<ProfileChange>,
    subscribers: usize,
}

/// ProfileEvents
///
/// One broadcast channel per subscribed profile owner. A channel is created on
/// the first subscription and removed when the last `Subscription` for that
/// owner goes away.
#[derive(Default)]
pub struct ProfileEvents {
    channels: Arc<Channels>,
}

pub type EventsState = Arc<ProfileEvents>;

/// Subscription
///
/// Handle returned by [`ProfileEvents::subscribe`]. Delivery stops when it is
/// cancelled or dropped.
pub struct Subscription {
    task: JoinHandle<()>,
    user_id: Uuid,
    channels: Weak<Channels>,
}

impl Subscription {
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();

        let Some(channels) = self.channels.upgrade() else {
            return;
        };
        let mut channels = channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(channel) = channels.get_mut(&self.user_id) {
            channel.subscribers = channel.subscribers.saturating_sub(1);
            if channel.subscribers == 0 {
                channels.remove(&self.user_id);
            }
        }
    }
}

impl ProfileEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// subscribe
    ///
    /// Registers `callback` for changes to the profile owned by `user_id`. Must be
    /// called from within a tokio runtime. A subscriber that falls more than
    /// `CHANNEL_CAPACITY` events behind skips the overflow and keeps going.
    pub fn subscribe<F>(&self, user_id: Uuid, callback: F) -> Subscription
    where
        F: Fn(ProfileChange) + Send + 'static,
    {
        let mut receiver = {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            let channel = channels.entry(user_id).or_insert_with(|| Channel {
                sender: broadcast::channel(CHANNEL_CAPACITY).0,
                subscribers: 0,
            });
            channel.subscribers += 1;
            channel.sender.subscribe()
        };

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => callback(change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%user_id, skipped, "profile subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Subscription {
            task,
            user_id,
            channels: Arc::downgrade(&self.channels),
        }
    }

    /// subscribe_buffered
    ///
    /// Like [`subscribe`](Self::subscribe), but hands changes to a bounded queue
    /// for a consumer that pulls at its own pace. When the queue is full the
    /// change is dropped, so a stalled consumer skips ahead instead of piling up.
    pub fn subscribe_buffered(
        &self,
        user_id: Uuid,
        capacity: usize,
    ) -> (mpsc::Receiver<ProfileChange>, Subscription) {
        let (tx, rx) = mpsc::channel(capacity);
        let subscription = self.subscribe(user_id, move |change| match tx.try_send(change) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%user_id, "profile consumer queue full; change dropped");
            }
            // Consumer gone. The subscription is dropped with it.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        });
        (rx, subscription)
    }

    /// publish
    ///
    /// Delivers `change` to every live subscriber of its owner. Returns the
    /// number of subscribers reached.
    pub fn publish(&self, change: ProfileChange) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());

        channels
            .get(&change.user_id)
            .and_then(|channel| channel.sender.send(change).ok())
            .unwrap_or(0)
    }

    /// Number of owners with at least one channel still registered.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
