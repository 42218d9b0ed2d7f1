use async_trait::async_trait;
use std::sync::Arc;

use super::{
    enqueue,
    reminder_content::{reminder_message, ReminderCategory},
    ReminderJob, ReminderReport,
};
use crate::{
    constants::*,
    models::{NotificationRecord, UserRecord},
    store::{NotificationStore, UserStore},
};

/// True when the user was last seen more than three days before `now`.
/// Users with no known activity are not considered inactive.
pub fn is_inactive(user: &UserRecord, now: u64) -> bool {
    let Some(last_seen) = user.last_seen() else {
        return false;
    };
    let cut_off = now.saturating_sub(INACTIVITY_THRESHOLD_SECS);
    last_seen < cut_off
}

/// Daily nudge for users who have not opened the app for a while
pub struct InactiveReminder {
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl InactiveReminder {
    pub fn new(users: Arc<dyn UserStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            users,
            notifications,
        }
    }
}

#[async_trait]
impl ReminderJob for InactiveReminder {
    fn name(&self) -> &'static str {
        "inactive_reminder"
    }

    async fn run(&self, now: u64) -> anyhow::Result<ReminderReport> {
        tracing::debug!("checking for inactive users");
        let users = self.users.list_users().await?;
        let mut report = ReminderReport::default();
        for user in users {
            report.scanned += 1;
            let Some(token) = user.reminder_token() else {
                report.skipped += 1;
                continue;
            };
            if !is_inactive(&user, now) {
                report.skipped += 1;
                continue;
            }
            let category = ReminderCategory::random().as_str();
            let message = reminder_message(category);
            let user_id = user.id.as_deref().unwrap_or_default();
            let record = NotificationRecord::new_pending(
                token,
                message.title,
                message.body,
                TYPE_INACTIVE_REMINDER,
                user_id,
                now,
            )
            .with_reminder_type(category);
            enqueue(self.notifications.as_ref(), &user, record, &mut report).await;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NOW: u64 = 1_700_000_000;
    const DAY: u64 = 24 * 60 * 60;

    fn user(last_active: Option<u64>, created_at: Option<u64>) -> UserRecord {
        UserRecord {
            id: Some("u1".to_owned()),
            fcm_token: Some("tok".to_owned()),
            notification_preferences: Some(vec!["Tips".to_owned()]),
            last_active,
            created_at,
            ..Default::default()
        }
    }

    #[test]
    fn test_inactivity_threshold() {
        assert!(is_inactive(&user(Some(NOW - 3 * DAY - 1), None), NOW));
        assert!(!is_inactive(&user(Some(NOW - 3 * DAY), None), NOW));
        assert!(!is_inactive(&user(Some(NOW - 2 * DAY), None), NOW));
        assert!(is_inactive(&user(None, Some(NOW - 10 * DAY)), NOW));
        assert!(!is_inactive(&user(Some(NOW - DAY), Some(NOW - 10 * DAY)), NOW));
        assert!(!is_inactive(&user(None, None), NOW));
    }

    #[tokio::test]
    async fn test_reminder_record() {
        let store = Arc::new(MemoryStore::new());
        store.add_user(user(Some(NOW - 4 * DAY), None));
        store.add_user(user(Some(NOW - DAY), None));
        let job = InactiveReminder::new(store.clone(), store.clone());

        let report = job.run(NOW).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        let records = store.notifications();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind.as_deref(), Some(TYPE_INACTIVE_REMINDER));
        let category = record.reminder_type.as_deref().unwrap();
        let expected = ReminderCategory::ALL
            .iter()
            .find(|c| c.as_str() == category)
            .unwrap()
            .message();
        assert_eq!(record.title, expected.title);
        assert_eq!(record.body, expected.body);
        assert_eq!(record.recipient_id.as_deref(), Some("u1"));
        assert!(record.is_pending());
    }
}
