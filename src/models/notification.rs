use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{deserialize_id, deserialize_ts};

/// Lifecycle of a notification record.
/// A record starts as `pending` and moves exactly once to `sent` or `failed`.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn to_bson(&self) -> anyhow::Result<Bson> {
        let bson = mongodb::bson::to_bson(self)?;
        Ok(bson)
    }
}

/// Delivery urgency hint forwarded to the push provider
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Only the literal `high` raises urgency, any other value is normal
    pub fn from_bson(val: Option<&Bson>) -> Self {
        match val {
            Some(Bson::String(s)) if s == "high" => Self::High,
            _ => Self::Normal,
        }
    }
}

fn deserialize_priority<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<Bson>::deserialize(deserializer)?;
    Ok(Priority::from_bson(val.as_ref()))
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(rename = "_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "deserialize_id")]
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(rename = "type")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_priority")]
    pub priority: Priority,

    pub status: NotificationStatus,

    #[serde(default, deserialize_with = "deserialize_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_ts")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationRecord {
    /// Build a new `pending` record addressed to a single device
    pub fn new_pending(
        token: &str,
        title: &str,
        body: &str,
        kind: &str,
        recipient_id: &str,
        ts: u64,
    ) -> Self {
        Self {
            token: Some(token.to_owned()),
            title: title.to_owned(),
            body: body.to_owned(),
            kind: Some(kind.to_owned()),
            recipient_id: Some(recipient_id.to_owned()),
            status: NotificationStatus::Pending,
            created_at: Some(ts),
            ..Default::default()
        }
    }

    pub fn with_reminder_type(mut self, reminder_type: &str) -> Self {
        self.reminder_type = Some(reminder_type.to_owned());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == NotificationStatus::Pending
    }
}

/// Terminal result of a single delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Sent { at: u64 },
    Failed { at: u64, error: String },
}

impl DeliveryOutcome {
    pub fn sent(at: u64) -> Self {
        Self::Sent { at }
    }

    pub fn failed(error: impl Into<String>, at: u64) -> Self {
        Self::Failed {
            at,
            error: error.into(),
        }
    }

    pub fn status(&self) -> NotificationStatus {
        match self {
            Self::Sent { .. } => NotificationStatus::Sent,
            Self::Failed { .. } => NotificationStatus::Failed,
        }
    }

    /// `$set` document applying this outcome to a stored record
    pub fn to_update_doc(&self) -> anyhow::Result<Document> {
        let status = self.status().to_bson()?;
        let update = match self {
            Self::Sent { at } => {
                let at = *at as i64;
                doc! {"status": status, "sentAt": at}
            }
            Self::Failed { at, error } => {
                let at = *at as i64;
                doc! {"status": status, "failedAt": at, "error": error.as_str()}
            }
        };
        Ok(doc! {"$set": update})
    }

    /// Apply this outcome to a record held in memory.
    /// Returns false when the record already left `pending`.
    pub fn apply(&self, record: &mut NotificationRecord) -> bool {
        if record.status.is_terminal() {
            return false;
        }
        record.status = self.status();
        match self {
            Self::Sent { at } => record.sent_at = Some(*at),
            Self::Failed { at, error } => {
                record.failed_at = Some(*at);
                record.error = Some(error.to_owned());
            }
        }
        true
    }
}
