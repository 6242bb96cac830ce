// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Problems loading or creating the webhook config file. Never fatal: callers
/// log them and fall back to the default URL.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid webhook url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("webhook responded with status {0}")]
    HttpStatus(u16),
    #[error("webhook transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostLookupError {
    #[error("server {0} is not registered with the proxy")]
    UnknownServer(String),
}
