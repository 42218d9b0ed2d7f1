use async_trait::async_trait;
use std::fmt;

use crate::{
    models::{NotificationRecord, UserRecord},
    store::NotificationStore,
};

pub mod hydration_reminder;
pub mod inactive_reminder;
pub mod reminder_content;

pub use hydration_reminder::HydrationReminder;
pub use inactive_reminder::InactiveReminder;

/// Counts produced by one producer run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub scanned: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for ReminderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {}, inserted {}, skipped {}, failed {}",
            self.scanned, self.inserted, self.skipped, self.failed
        )
    }
}

/// A scheduled batch job enqueueing reminder notifications
#[async_trait]
pub trait ReminderJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scan users once. `now` is the current epoch time in seconds.
    /// Fails only when the user scan itself fails.
    async fn run(&self, now: u64) -> anyhow::Result<ReminderReport>;
}

/// Insert one reminder, keeping a single failure from aborting the scan
async fn enqueue(
    store: &dyn NotificationStore,
    user: &UserRecord,
    record: NotificationRecord,
    report: &mut ReminderReport,
) {
    let user_id = user.id.as_deref().unwrap_or_default();
    match store.insert(&record).await {
        Ok(id) => {
            let kind = record.kind.as_deref().unwrap_or_default();
            tracing::debug!("queued {kind} notification {id} for user {user_id}");
            report.inserted += 1;
        }
        Err(err) => {
            tracing::error!("unable to queue reminder for user {user_id}: {err}");
            report.failed += 1;
        }
    }
}
