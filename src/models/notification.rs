// src/models/notification.rs
use serde::{Deserialize, Serialize};

/// Body of every outbound webhook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub content: String,
}

impl NotificationPayload {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PlayerJoined,
    ServerEmpty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub kind: NotificationKind,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: u64,
}
