use async_trait::async_trait;
use std::sync::Arc;

use super::{enqueue, reminder_content::HYDRATION_REMINDER, ReminderJob, ReminderReport};
use crate::{
    constants::*,
    models::NotificationRecord,
    store::{NotificationStore, UserStore},
};

/// Hydration nudge for every user who accepts tips, several times a day
pub struct HydrationReminder {
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl HydrationReminder {
    pub fn new(users: Arc<dyn UserStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            users,
            notifications,
        }
    }
}

#[async_trait]
impl ReminderJob for HydrationReminder {
    fn name(&self) -> &'static str {
        "hydration_reminder"
    }

    async fn run(&self, now: u64) -> anyhow::Result<ReminderReport> {
        tracing::debug!("sending hydration reminders");
        let users = self.users.list_users().await?;
        let mut report = ReminderReport::default();
        for user in users {
            report.scanned += 1;
            let Some(token) = user.reminder_token() else {
                report.skipped += 1;
                continue;
            };
            let user_id = user.id.as_deref().unwrap_or_default();
            let record = NotificationRecord::new_pending(
                token,
                HYDRATION_REMINDER.title,
                HYDRATION_REMINDER.body,
                TYPE_HYDRATION_REMINDER,
                user_id,
                now,
            );
            enqueue(self.notifications.as_ref(), &user, record, &mut report).await;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::UserRecord,
        store::{MemoryStore, MockUserStore, StoreError},
    };

    fn user(id: &str, token: Option<&str>, preferences: &[&str]) -> UserRecord {
        UserRecord {
            id: Some(id.to_owned()),
            fcm_token: token.map(str::to_owned),
            notification_preferences: Some(preferences.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_only_eligible_users_get_reminders() {
        let store = Arc::new(MemoryStore::new());
        store.add_user(user("a", Some("tok-a"), &["Tips"]));
        store.add_user(user("b", None, &["Tips"]));
        store.add_user(user("c", Some("tok-c"), &["Recipes"]));
        store.add_user(user("d", Some("tok-d"), &["Tips", "None"]));
        let job = HydrationReminder::new(store.clone(), store.clone());

        let report = job.run(1_000).await.unwrap();
        assert_eq!(report.scanned, 4);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 3);
        let records = store.notifications();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.token.as_deref(), Some("tok-a"));
        assert_eq!(record.recipient_id.as_deref(), Some("a"));
        assert_eq!(record.kind.as_deref(), Some(TYPE_HYDRATION_REMINDER));
        assert_eq!(record.title, HYDRATION_REMINDER.title);
        assert_eq!(record.created_at, Some(1_000));
        assert!(record.is_pending());
        assert!(record.reminder_type.is_none());
    }

    #[tokio::test]
    async fn test_user_scan_failure_fails_the_run() {
        let mut users = MockUserStore::new();
        users
            .expect_list_users()
            .times(1)
            .returning(|| Err(StoreError::Interrupted("no primary".to_owned())));
        let job = HydrationReminder::new(Arc::new(users), Arc::new(MemoryStore::new()));
        assert!(job.run(1_000).await.is_err());
    }
}
