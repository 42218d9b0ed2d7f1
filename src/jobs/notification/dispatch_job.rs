use futures::stream::StreamExt;
use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::Mutex,
    task::{JoinError, JoinSet},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use super::push_message::{DeliveryError, PushGateway, PushMessage};
use crate::{
    constants::*,
    models::{DeliveryOutcome, NotificationRecord},
    store::{ChangeFeed, NotificationStore, RecordChange, StoreError},
    utils::get_epoch_ts,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// Wait before re-opening a broken change feed
    pub resubscribe_delay: Duration,
    /// Upper bound for one gateway call and for one status update
    pub call_timeout: Duration,
    /// Dispatch records that were already pending whenever the feed is opened
    pub rescan_pending: bool,
    pub rescan_limit: i64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            resubscribe_delay: Duration::from_secs(RESUBSCRIBE_DELAY_SECS),
            call_timeout: Duration::from_secs(DISPATCH_CALL_TIMEOUT_SECS),
            rescan_pending: true,
            rescan_limit: RESCAN_PENDING_LIMIT,
        }
    }
}

/// Delivers a single record and writes back its terminal status
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn NotificationStore>,
    gateway: Arc<dyn PushGateway>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        gateway: Arc<dyn PushGateway>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            call_timeout,
        }
    }

    /// One delivery attempt followed by exactly one status update.
    /// Failures are terminal, nothing is retried.
    pub async fn deliver(&self, id: &str, record: &NotificationRecord) -> DeliveryOutcome {
        tracing::debug!("processing notification {id}");
        let message = PushMessage::from_record(record);
        let result = match timeout(self.call_timeout, self.gateway.send(&message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout),
        };
        let outcome = match result {
            Ok(()) => {
                tracing::info!("push notification sent for {id}");
                DeliveryOutcome::sent(get_epoch_ts())
            }
            Err(err) => {
                tracing::warn!("error sending notification {id}: {err}");
                DeliveryOutcome::failed(err.to_string(), get_epoch_ts())
            }
        };
        let status = outcome.status().as_str();
        match timeout(self.call_timeout, self.store.record_outcome(id, &outcome)).await {
            Ok(Ok(true)) => tracing::debug!("notification {id} marked {status}"),
            Ok(Ok(false)) => {
                tracing::warn!("notification {id} already left pending, {status} not recorded")
            }
            Ok(Err(err)) => tracing::error!("unable to mark notification {id} {status}: {err}"),
            Err(_) => tracing::error!("timed out marking notification {id} {status}"),
        }
        outcome
    }
}

/// Ids currently being delivered plus a bounded window of ids that already
/// finished. A record seen by both the rescan and the feed is delivered once.
#[derive(Debug)]
struct DispatchedIds {
    in_flight: HashSet<String>,
    settled: HashSet<String>,
    settled_order: VecDeque<String>,
    capacity: usize,
}

impl DispatchedIds {
    fn new(capacity: usize) -> Self {
        Self {
            in_flight: HashSet::new(),
            settled: HashSet::new(),
            settled_order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// False when the id is in flight or settled recently
    fn claim(&mut self, id: &str) -> bool {
        if self.settled.contains(id) {
            return false;
        }
        self.in_flight.insert(id.to_owned())
    }

    fn settle(&mut self, id: &str) {
        self.in_flight.remove(id);
        if !self.settled.insert(id.to_owned()) {
            return;
        }
        self.settled_order.push_back(id.to_owned());
        while self.settled_order.len() > self.capacity {
            if let Some(oldest) = self.settled_order.pop_front() {
                self.settled.remove(&oldest);
            }
        }
    }
}

enum FeedStep {
    Shutdown,
    Change(Option<Result<RecordChange, StoreError>>),
    Finished(Result<(), JoinError>),
}

/// Long-lived watcher forwarding newly inserted pending records to the gateway.
///
/// Each record is delivered in its own task. The watcher keeps the tasks in a
/// `JoinSet`, skips records that are in flight or were delivered recently and
/// drains the set on shutdown. A broken subscription is re-opened after `resubscribe_delay`.
pub struct DispatchWatcher {
    store: Arc<dyn NotificationStore>,
    dispatcher: Dispatcher,
    settings: DispatchSettings,
    dispatched: Arc<Mutex<DispatchedIds>>,
    tasks: JoinSet<()>,
}

impl DispatchWatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        gateway: Arc<dyn PushGateway>,
        settings: DispatchSettings,
    ) -> Self {
        let dispatcher = Dispatcher::new(store.clone(), gateway, settings.call_timeout);
        // must cover a whole rescan batch
        let rescan_limit = usize::try_from(settings.rescan_limit).unwrap_or(0);
        let capacity = SETTLED_IDS_CAPACITY.max(rescan_limit.saturating_mul(2));
        Self {
            store,
            dispatcher,
            settings,
            dispatched: Arc::new(Mutex::new(DispatchedIds::new(capacity))),
            tasks: JoinSet::new(),
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::debug!("initializing notification dispatch watcher");
        loop {
            let subscribed = tokio::select! {
                _ = shutdown.cancelled() => break,
                subscribed = self.store.subscribe_pending() => subscribed,
            };
            match subscribed {
                Ok(feed) => {
                    tracing::info!("listening for pending notifications");
                    if self.settings.rescan_pending {
                        self.rescan_pending().await;
                    }
                    if self.consume(feed, &shutdown).await {
                        break;
                    }
                }
                Err(err) => tracing::error!("unable to subscribe to pending notifications: {err}"),
            }
            let delay = self.settings.resubscribe_delay;
            tracing::warn!("re-subscribing to pending notifications in {:?}", delay);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }
        self.drain().await;
        tracing::info!("notification dispatch watcher stopped");
    }

    /// Returns true when shutdown was requested, false when the feed broke
    async fn consume(&mut self, mut feed: ChangeFeed, shutdown: &CancellationToken) -> bool {
        loop {
            let step = tokio::select! {
                _ = shutdown.cancelled() => FeedStep::Shutdown,
                Some(finished) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    FeedStep::Finished(finished)
                }
                change = feed.next() => FeedStep::Change(change),
            };
            match step {
                FeedStep::Shutdown => return true,
                FeedStep::Finished(finished) => log_finished(finished),
                FeedStep::Change(Some(Ok(change))) => self.dispatch(change).await,
                FeedStep::Change(Some(Err(err))) => {
                    tracing::error!("pending notification feed error: {err}");
                    return false;
                }
                FeedStep::Change(None) => {
                    tracing::warn!("pending notification feed closed");
                    return false;
                }
            }
        }
    }

    /// Pick up records that were pending before the feed was opened
    async fn rescan_pending(&mut self) {
        let records = match self.store.find_pending(self.settings.rescan_limit).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!("unable to scan pending notifications: {err}");
                return;
            }
        };
        if !records.is_empty() {
            tracing::info!("found {} pending notifications", records.len());
        }
        for change in records.into_iter().filter_map(RecordChange::from_record) {
            self.dispatch(change).await;
        }
    }

    async fn dispatch(&mut self, change: RecordChange) {
        let RecordChange { id, record } = change;
        if !self.dispatched.lock().await.claim(&id) {
            tracing::debug!("notification {id} is already dispatched");
            return;
        }
        let dispatcher = self.dispatcher.clone();
        let dispatched = self.dispatched.clone();
        self.tasks.spawn(async move {
            dispatcher.deliver(&id, &record).await;
            dispatched.lock().await.settle(&id);
        });
    }

    async fn drain(&mut self) {
        if !self.tasks.is_empty() {
            tracing::info!("waiting for {} in-flight deliveries", self.tasks.len());
        }
        while let Some(finished) = self.tasks.join_next().await {
            log_finished(finished);
        }
    }
}

fn log_finished(finished: Result<(), JoinError>) {
    if let Err(err) = finished {
        tracing::error!("notification delivery task failed: {err}");
    }
}
