// src/utils.rs
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::RateLimiter;
use log::error;
use std::fmt;
use std::net::IpAddr;

pub type EventRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Debug)]
pub enum RequestError {
    MissingPeerIP,
    RateLimitExceeded,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPeerIP => write!(f, "Failed to extract client IP"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
        }
    }
}

impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::RateLimitExceeded => HttpResponse::TooManyRequests().body(self.to_string()),
            Self::MissingPeerIP => HttpResponse::BadRequest().body(self.to_string()),
        }
    }
}

pub fn peer_ip(req: &HttpRequest) -> Result<IpAddr, RequestError> {
    req.peer_addr()
        .map(|addr| addr.ip())
        .ok_or(RequestError::MissingPeerIP)
}

/// Resolves the caller and charges one event against its quota.
pub fn check_rate_limit(
    req: &HttpRequest,
    rate_limiter: &EventRateLimiter,
) -> Result<IpAddr, RequestError> {
    let ip = peer_ip(req)?;
    if rate_limiter.check_key(&ip).is_err() {
        error!("Rate limit exceeded for {} on {}", ip, req.path());
        return Err(RequestError::RateLimitExceeded);
    }
    Ok(ip)
}
