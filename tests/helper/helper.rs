#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use std::{sync::Mutex, time::Duration};
use tokio::time::{sleep, Instant};

use smartdiet_push_relay::jobs::notification::{
    DeliveryError, DispatchSettings, PushGateway, PushMessage,
};

type SendPolicy = dyn Fn(&PushMessage) -> Result<(), DeliveryError> + Send + Sync;

/// Gateway recording every attempted message and answering with `policy`
pub struct FakeGateway {
    sent: Mutex<Vec<PushMessage>>,
    delay: Duration,
    policy: Box<SendPolicy>,
}

impl FakeGateway {
    pub fn accepting() -> Self {
        Self::with_policy(|_| Ok(()))
    }

    /// Rejects every message sent to `token`, accepts the rest
    pub fn rejecting(token: &'static str) -> Self {
        Self::with_policy(move |message| {
            if message.token.as_deref() == Some(token) {
                return Err(DeliveryError::Rejected {
                    status: 400,
                    message: "The registration token is not a valid FCM registration token"
                        .to_owned(),
                });
            }
            Ok(())
        })
    }

    pub fn with_policy<F>(policy: F) -> Self
    where
        F: Fn(&PushMessage) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        Self {
            sent: Mutex::new(vec![]),
            delay: Duration::ZERO,
            policy: Box::new(policy),
        }
    }

    /// Every send waits `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if message.token.as_deref().map_or(true, str::is_empty) {
            return Err(DeliveryError::MissingToken);
        }
        (self.policy)(message)
    }
}

/// Short delays and no startup rescan, so attempt counts are exact
pub fn fast_settings() -> DispatchSettings {
    DispatchSettings {
        resubscribe_delay: Duration::from_millis(50),
        call_timeout: Duration::from_secs(2),
        rescan_pending: false,
        ..Default::default()
    }
}

/// Poll `check` until it returns true, panicking after five seconds
pub async fn wait_until<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        if Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        sleep(Duration::from_millis(20)).await;
    }
}

pub fn build_get_request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}
