// src/models/events.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::HostLookupError;

/// Posted by the proxy once per player login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub player: String,
    pub total_players: usize,
    /// Host topology at the time of the login: server name -> connected players.
    #[serde(default)]
    pub servers: HashMap<String, usize>,
}

/// Periodic occupancy check posted by the proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccupancyReport {
    #[serde(default)]
    pub servers: HashMap<String, usize>,
}

pub fn occupancy_of(
    servers: &HashMap<String, usize>,
    server_id: &str,
) -> Result<usize, HostLookupError> {
    servers
        .get(server_id)
        .copied()
        .ok_or_else(|| HostLookupError::UnknownServer(server_id.to_string()))
}

impl LoginEvent {
    pub fn occupancy_of(&self, server_id: &str) -> Result<usize, HostLookupError> {
        occupancy_of(&self.servers, server_id)
    }
}

impl OccupancyReport {
    pub fn occupancy_of(&self, server_id: &str) -> Result<usize, HostLookupError> {
        occupancy_of(&self.servers, server_id)
    }
}
