use std::env;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use governor::Quota;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://n8n.luzdelossiglos.org.ar/webhook-test/af8b6014-368e-4acb-9b04-225aebd63a72";
pub const CONFIG_FILE_NAME: &str = "config.yml";

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,

    // Monitoring
    pub watched_server: String,
    pub empty_timeout_secs: u64,

    // Webhook delivery
    pub config_dir: PathBuf,
    pub webhook_timeout_secs: u64,

    // Event ingress rate limiting
    pub event_period_secs: u64,
    pub event_burst_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            watched_server: "lobby".to_string(),
            empty_timeout_secs: 30 * 60,
            config_dir: PathBuf::from("WebHook Power"),
            webhook_timeout_secs: 10,
            event_period_secs: 1,
            event_burst_limit: 50,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("BIND_ADDRESS", defaults.bind_address),
            port: env_or("PORT", defaults.port),
            watched_server: env_or("WATCHED_SERVER", defaults.watched_server),
            empty_timeout_secs: env_or("EMPTY_TIMEOUT_SECS", defaults.empty_timeout_secs),
            config_dir: env_or("CONFIG_DIR", defaults.config_dir),
            webhook_timeout_secs: env_or("WEBHOOK_TIMEOUT_SECS", defaults.webhook_timeout_secs),
            event_period_secs: env_or("EVENT_PERIOD_SECS", defaults.event_period_secs),
            event_burst_limit: env_or("EVENT_BURST_LIMIT", defaults.event_burst_limit),
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn empty_timeout(&self) -> Duration {
        Duration::from_secs(self.empty_timeout_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    /// Zero values in the environment degrade to one event per second rather
    /// than refusing to start.
    pub fn event_quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.event_burst_limit).unwrap_or(NonZeroU32::MIN);
        Quota::with_period(Duration::from_secs(self.event_period_secs))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }
}

/// On-disk shape of `config.yml`. Only top-level keys are read.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    webhook_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
        }
    }
}

impl WebhookConfig {
    /// Reads `config.yml` from `dir`, writing one with the default URL first
    /// if it does not exist yet.
    pub fn load_or_create(dir: &Path) -> Result<Self, ConfigError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let contents = serde_yaml::to_string(&ConfigFile {
                webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            })
            .map_err(|e| ConfigError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            fs::write(&path, contents).map_err(|source| ConfigError::WriteFile {
                path: path.clone(),
                source,
            })?;
            info!("Created webhook config at {}", path.display());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;

        let file: ConfigFile =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let url = file.webhook_url.trim().to_string();
        reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { url })
    }

    pub fn load_or_default(dir: &Path) -> Self {
        match Self::load_or_create(dir) {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default webhook url: {}", e);
                Self::default()
            }
        }
    }
}
