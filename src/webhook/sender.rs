// src/webhook/sender.rs
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::StatusCode;
use std::time::Duration;

use crate::error::SendError;
use crate::models::notification::NotificationPayload;

/// Returned when the endpoint answered with exactly 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// Stateless webhook poster. Cloning is cheap and shares the connection pool.
/// Retry policy belongs to the caller.
#[derive(Clone, Debug)]
pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn send(&self, url: &str, content: &str) -> Result<Ack, SendError> {
        let payload = NotificationPayload::new(content);
        debug!("Posting webhook to {}: {}", url, payload.content);

        let response = match self.client.post(url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to deliver webhook to {}: {}", url, e);
                return Err(SendError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            info!("Webhook notification delivered to {}", url);
            Ok(Ack)
        } else {
            error!("Webhook notification rejected by {}: {}", url, status.as_u16());
            Err(SendError::HttpStatus(status.as_u16()))
        }
    }
}

/// Delivery seam used by the event adapter.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, content: &str) -> Result<Ack, SendError>;
}

#[async_trait]
impl Notifier for WebhookSender {
    async fn notify(&self, url: &str, content: &str) -> Result<Ack, SendError> {
        self.send(url, content).await
    }
}
