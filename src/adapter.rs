// src/adapter.rs
use log::{info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::{Config, WebhookConfig};
use crate::error::{HostLookupError, SendError};
use crate::models::events::OccupancyReport;
use crate::models::notification::{DeliveryRecord, NotificationKind};
use crate::monitor::{EmptyServerMonitor, PendingTimer};
use crate::webhook::{Ack, Notifier, WebhookSender};

type LastDelivery = Arc<RwLock<Option<DeliveryRecord>>>;

#[derive(Debug, Serialize)]
pub struct AdapterStatus {
    pub watched_server: String,
    pub empty_timer: Option<PendingTimer>,
    pub last_delivery: Option<DeliveryRecord>,
}

/// Glue between the proxy's events and the monitor/sender pair.
pub struct EventAdapter {
    watched_server: String,
    webhook: WebhookConfig,
    notifier: Arc<dyn Notifier>,
    monitor: EmptyServerMonitor,
    last_delivery: LastDelivery,
}

impl EventAdapter {
    /// Startup hook: resolves the webhook config (never fails, see
    /// `WebhookConfig::load_or_default`) and wires everything together.
    pub fn on_initialize(config: &Config, sender: WebhookSender) -> Self {
        let webhook = WebhookConfig::load_or_default(&config.config_dir);
        let adapter = Self::new(
            config.watched_server.clone(),
            config.empty_timeout(),
            webhook,
            Arc::new(sender),
        );
        info!(
            "Webhook notifier ready: watching '{}' ({}s empty delay), posting to {}",
            adapter.watched_server,
            adapter.monitor.delay().as_secs(),
            adapter.webhook.url
        );
        adapter
    }

    pub fn new(
        watched_server: String,
        empty_timeout: Duration,
        webhook: WebhookConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let last_delivery: LastDelivery = Arc::new(RwLock::new(None));

        let monitor = {
            let notifier = notifier.clone();
            let url = webhook.url.clone();
            let last_delivery = last_delivery.clone();

            EmptyServerMonitor::new(empty_timeout, move |server_id| {
                let notifier = notifier.clone();
                let url = url.clone();
                let last_delivery = last_delivery.clone();
                tokio::spawn(async move {
                    let content = server_empty_message(&server_id, empty_timeout);
                    let result = notifier.notify(&url, &content).await;
                    record(&last_delivery, NotificationKind::ServerEmpty, &result);
                });
            })
        };

        Self {
            watched_server,
            webhook,
            notifier,
            monitor,
            last_delivery,
        }
    }

    pub fn watched_server(&self) -> &str {
        &self.watched_server
    }

    #[cfg(test)]
    pub fn monitor(&self) -> &EmptyServerMonitor {
        &self.monitor
    }

    /// The join notification goes out on every login, whatever the monitor did.
    pub async fn on_player_login(
        &self,
        player: &str,
        total_players: usize,
        watched_occupancy: Result<usize, HostLookupError>,
    ) -> Result<Ack, SendError> {
        self.track(watched_occupancy);

        let content = player_joined_message(player, total_players);
        let result = self.notifier.notify(&self.webhook.url, &content).await;
        record(&self.last_delivery, NotificationKind::PlayerJoined, &result);
        result
    }

    /// Returns whether the watched server was present in the report.
    pub fn on_occupancy_check(&self, report: &OccupancyReport) -> bool {
        self.track(report.occupancy_of(&self.watched_server))
    }

    pub fn status(&self) -> AdapterStatus {
        AdapterStatus {
            watched_server: self.watched_server.clone(),
            empty_timer: self
                .monitor
                .pending()
                .into_iter()
                .find(|t| t.server_id == self.watched_server),
            last_delivery: self.last_delivery.read().clone(),
        }
    }

    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }

    fn track(&self, occupancy: Result<usize, HostLookupError>) -> bool {
        match occupancy {
            Ok(players) => {
                self.monitor
                    .report_occupancy(&self.watched_server, players > 0);
                true
            }
            Err(e) => {
                warn!("No occupancy data, empty tracking skipped: {}", e);
                false
            }
        }
    }
}

fn player_joined_message(player: &str, total_players: usize) -> String {
    format!("Player {} connected. Total players: {}", player, total_players)
}

fn server_empty_message(server_id: &str, delay: Duration) -> String {
    format!("Server {} has been empty for {}.", server_id, describe_delay(delay))
}

/// Whole minutes read as minutes, anything else as seconds.
fn describe_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (minutes, 0) if minutes > 0 => format!("{} minutes", minutes),
        _ if secs == 1 => "1 second".to_string(),
        _ => format!("{} seconds", secs),
    }
}

fn record(
    last_delivery: &LastDelivery,
    kind: NotificationKind,
    result: &Result<Ack, SendError>,
) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    *last_delivery.write() = Some(DeliveryRecord {
        kind,
        success: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
        timestamp,
    });
}
