#![allow(dead_code)]

use smartdiet_push_relay::models::{NotificationRecord, UserRecord};

pub fn user_with(
    id: &str,
    token: Option<&str>,
    preferences: &[&str],
    last_active: Option<u64>,
) -> UserRecord {
    UserRecord {
        id: Some(id.to_owned()),
        fcm_token: token.map(str::to_owned),
        notification_preferences: Some(preferences.iter().map(|p| p.to_string()).collect()),
        last_active,
        ..Default::default()
    }
}

pub fn pending_notification(token: Option<&str>, title: &str) -> NotificationRecord {
    let mut record = NotificationRecord::new_pending(
        token.unwrap_or_default(),
        title,
        "Open SmartDiet to see more",
        "mealReminder",
        "u1",
        1_700_000_000,
    );
    record.token = token.map(str::to_owned);
    record
}
