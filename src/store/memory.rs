use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard,
};
use tokio::sync::broadcast::{self, error::RecvError};

use super::{ChangeFeed, NotificationStore, RecordChange, StoreError, UserStore};
use crate::models::{DeliveryOutcome, NotificationRecord, UserRecord};

const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
enum FeedEvent {
    Inserted(RecordChange),
    Interrupted(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    notifications: Vec<NotificationRecord>,
    users: Vec<UserRecord>,
}

/// In-process store with a broadcast channel standing in for the change feed
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    feed: broadcast::Sender<FeedEvent>,
    subscriptions: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            feed,
            subscriptions: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // the state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_user(&self, user: UserRecord) {
        self.state().users.push(user);
    }

    /// Snapshot of every stored notification, in insertion order
    pub fn notifications(&self) -> Vec<NotificationRecord> {
        self.state().notifications.clone()
    }

    pub fn get(&self, id: &str) -> Option<NotificationRecord> {
        self.state()
            .notifications
            .iter()
            .find(|record| record.id.as_deref() == Some(id))
            .cloned()
    }

    /// Number of times the pending feed has been opened
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Break every open subscription, as a lost connection would
    pub fn interrupt_feed(&self, reason: &str) {
        let _ = self.feed.send(FeedEvent::Interrupted(reason.to_owned()));
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, record: &NotificationRecord) -> Result<String, StoreError> {
        let change = {
            let mut state = self.state();
            state.next_id += 1;
            let id = format!("{:024x}", state.next_id);
            let mut record = record.clone();
            record.id = Some(id.clone());
            state.notifications.push(record.clone());
            RecordChange { id, record }
        };
        let id = change.id.clone();
        if change.record.is_pending() {
            // no receivers just means nobody is watching
            let _ = self.feed.send(FeedEvent::Inserted(change));
        }
        Ok(id)
    }

    async fn subscribe_pending(&self) -> Result<ChangeFeed, StoreError> {
        let receiver = self.feed.subscribe();
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let feed = stream::unfold(receiver, |mut receiver| async move {
            let item = match receiver.recv().await {
                Ok(FeedEvent::Inserted(change)) => Ok(change),
                Ok(FeedEvent::Interrupted(reason)) => Err(StoreError::Interrupted(reason)),
                Err(RecvError::Lagged(missed)) => Err(StoreError::Interrupted(format!(
                    "subscriber lagged behind by {missed} events"
                ))),
                Err(RecvError::Closed) => return None,
            };
            Some((item, receiver))
        });
        Ok(feed.boxed())
    }

    async fn find_pending(&self, limit: i64) -> Result<Vec<NotificationRecord>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let pending = self
            .state()
            .notifications
            .iter()
            .filter(|record| record.is_pending())
            .take(limit)
            .cloned()
            .collect();
        Ok(pending)
    }

    async fn record_outcome(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<bool, StoreError> {
        let mut state = self.state();
        let record = state
            .notifications
            .iter_mut()
            .find(|record| record.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        Ok(outcome.apply(record))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state().users.clone())
    }
}
