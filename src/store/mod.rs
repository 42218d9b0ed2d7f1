//! Storage contracts used by the dispatch watcher and the reminder producers.
//!
//! `AppDatabase` implements them on MongoDB (change streams back the pending
//! feed) and `MemoryStore` implements them in process.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::models::{DeliveryOutcome, NotificationRecord, UserRecord};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid record id `{0}`")]
    InvalidId(String),
    #[error("record `{0}` not found")]
    NotFound(String),
    #[error("store connection interrupted: {0}")]
    Interrupted(String),
}

/// A newly inserted pending record surfaced by the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChange {
    pub id: String,
    pub record: NotificationRecord,
}

impl RecordChange {
    /// Wrap a stored record; records without an id cannot be tracked
    pub fn from_record(record: NotificationRecord) -> Option<Self> {
        let id = record.id.clone()?;
        Some(Self { id, record })
    }
}

pub type ChangeFeed = BoxStream<'static, Result<RecordChange, StoreError>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a new record and return the id assigned by the store
    async fn insert(&self, record: &NotificationRecord) -> Result<String, StoreError>;

    /// Subscribe to insertions of `pending` records, in insertion order.
    /// An `Err` item means the subscription is broken and must be re-opened.
    async fn subscribe_pending(&self) -> Result<ChangeFeed, StoreError>;

    /// Existing `pending` records, oldest first
    async fn find_pending(&self, limit: i64) -> Result<Vec<NotificationRecord>, StoreError>;

    /// Move a `pending` record to its terminal status.
    /// Returns false when the record was no longer pending.
    async fn record_outcome(&self, id: &str, outcome: &DeliveryOutcome)
        -> Result<bool, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Full scan over user records. Malformed documents are skipped.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;
}
