use serde::{Deserialize, Serialize};

use crate::{
    constants::*,
    utils::{deserialize_id, deserialize_ts},
};

/// User document as written by the mobile app.
/// This service only ever reads it.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "deserialize_id")]
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl UserRecord {
    /// Device token, if the user registered a non-empty one
    pub fn device_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Notification categories the user opted into.
    /// `notificationPreferences` wins over the legacy `notifications` field.
    pub fn preferences(&self) -> &[String] {
        self.notification_preferences
            .as_deref()
            .or(self.notifications.as_deref())
            .unwrap_or_default()
    }

    /// Reminders are delivered under the `Tips` category
    pub fn accepts_tips(&self) -> bool {
        let preferences = self.preferences();
        let opted_out = preferences.iter().any(|p| p == NO_NOTIFICATIONS);
        !opted_out && preferences.iter().any(|p| p == TIPS_CATEGORY)
    }

    /// Token of a user eligible for reminder notifications
    pub fn reminder_token(&self) -> Option<&str> {
        if !self.accepts_tips() {
            return None;
        }
        self.device_token()
    }

    /// Last activity, falling back to the sign-up time
    pub fn last_seen(&self) -> Option<u64> {
        self.last_active.or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{doc, from_document, DateTime};

    use super::*;

    fn user_with(preferences: &[&str]) -> UserRecord {
        UserRecord {
            id: Some("u1".to_owned()),
            fcm_token: Some("tok".to_owned()),
            notification_preferences: Some(preferences.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_tips() {
        assert!(user_with(&["Tips"]).accepts_tips());
        assert!(user_with(&["Recipes", "Tips"]).accepts_tips());
        assert!(!user_with(&["Recipes"]).accepts_tips());
        assert!(!user_with(&["None"]).accepts_tips());
        assert!(!user_with(&["Tips", "None"]).accepts_tips());
        assert!(!user_with(&[]).accepts_tips());
    }

    #[test]
    fn test_legacy_preferences_field() {
        let user = UserRecord {
            fcm_token: Some("tok".to_owned()),
            notifications: Some(vec!["Tips".to_owned()]),
            ..Default::default()
        };
        assert!(user.accepts_tips());
        let user = UserRecord {
            notification_preferences: Some(vec![]),
            ..user
        };
        assert!(!user.accepts_tips());
    }

    #[test]
    fn test_reminder_token() {
        assert_eq!(user_with(&["Tips"]).reminder_token(), Some("tok"));
        let mut user = user_with(&["Tips"]);
        user.fcm_token = Some(String::new());
        assert_eq!(user.reminder_token(), None);
        user.fcm_token = None;
        assert_eq!(user.reminder_token(), None);
        assert_eq!(user_with(&["None"]).reminder_token(), None);
    }

    #[test]
    fn test_last_seen_fallback() {
        let document = doc! {
            "_id": "uid-1",
            "fcmToken": "tok",
            "createdAt": DateTime::from_millis(1_000_000),
        };
        let user: UserRecord = from_document(document).unwrap();
        assert_eq!(user.id.as_deref(), Some("uid-1"));
        assert_eq!(user.last_seen(), Some(1_000));
        let user = UserRecord {
            last_active: Some(2_000),
            ..user
        };
        assert_eq!(user.last_seen(), Some(2_000));
    }
}
