use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;
use tokio::sync::Mutex;

use super::google_auth_token::GoogleAuthToken;
use crate::{
    config::ServiceAccount,
    constants::*,
    models::{NotificationRecord, Priority},
};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("notification has no device token")]
    MissingToken,
    #[error("unable to authorize with the push provider: {0}")]
    Auth(String),
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("push provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("push request timed out")]
    Timeout,
}

/// Provider-neutral push message built from a notification record
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: Option<String>,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub priority: Priority,
}

impl PushMessage {
    pub fn from_record(record: &NotificationRecord) -> Self {
        let mut data = BTreeMap::new();
        data.insert("type".to_owned(), record.kind.clone().unwrap_or_default());
        data.insert("click_action".to_owned(), FCM_CLICK_ACTION.to_owned());
        let tags = [
            ("reminderType", &record.reminder_type),
            ("senderId", &record.sender_id),
            ("recipeTitle", &record.recipe_title),
        ];
        for (key, val) in tags {
            if let Some(val) = val.as_ref().filter(|val| !val.is_empty()) {
                data.insert(key.to_owned(), val.to_owned());
            }
        }
        Self {
            token: record.token.clone(),
            title: record.title.to_owned(),
            body: record.body.to_owned(),
            data,
            priority: record.priority,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver one message to one device
    async fn send(&self, message: &PushMessage) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "UPPERCASE")]
enum AndroidPriority {
    Normal,
    High,
}

impl From<Priority> for AndroidPriority {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::High => Self::High,
            Priority::Normal => Self::Normal,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushAndroidNotification {
    sound: String,
    click_action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushAndroid {
    priority: AndroidPriority,
    notification: PushAndroidNotification,
}

#[derive(Debug, Serialize)]
struct PushMessageNotification {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FcmMessage {
    token: String,
    notification: PushMessageNotification,
    data: BTreeMap<String, String>,
    android: PushAndroid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload {
    message: FcmMessage,
}

impl PushPayload {
    fn new(message: &PushMessage, device: &str) -> Self {
        let android = PushAndroid {
            priority: message.priority.into(),
            notification: PushAndroidNotification {
                sound: FCM_DEFAULT_SOUND.to_string(),
                click_action: FCM_CLICK_ACTION.to_string(),
            },
        };
        let notification = PushMessageNotification {
            title: message.title.to_owned(),
            body: message.body.to_owned(),
        };
        let message = FcmMessage {
            token: device.to_string(),
            notification,
            data: message.data.clone(),
            android,
        };
        Self { message }
    }
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FcmErrorResponse {
    error: FcmErrorBody,
}

/// Firebase Cloud Messaging HTTP v1 client
pub struct FcmGateway {
    client: reqwest::Client,
    endpoint: String,
    auth: Mutex<GoogleAuthToken>,
}

impl FcmGateway {
    pub fn new(account: ServiceAccount, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}/{}/messages:send", FCM_ENDPOINT_BASE, account.project_id);
        let auth = GoogleAuthToken::new(account, client.clone());
        Ok(Self {
            client,
            endpoint,
            auth: Mutex::new(auth),
        })
    }

    async fn access_token(&self) -> Result<String, DeliveryError> {
        // the lock also serializes token refreshes
        let mut auth = self.auth.lock().await;
        let token = auth
            .get_access_token()
            .await
            .map_err(|err| DeliveryError::Auth(err.to_string()))?;
        Ok(token.to_owned())
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), DeliveryError> {
        let Some(device) = message.token.as_deref().filter(|token| !token.is_empty()) else {
            return Err(DeliveryError::MissingToken);
        };
        let access_token = self.access_token().await?;
        let payload = PushPayload::new(message, device);
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let message = match res.json::<FcmErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_owned(),
        };
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
