// src/monitor/empty_server.rs
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type EmptyCallback = Box<dyn Fn(String) + Send + Sync>;

struct EmptyTimer {
    generation: u64,
    started_at: Instant,
    handle: JoinHandle<()>,
}

struct Inner {
    timers: DashMap<String, EmptyTimer>,
    delay: Duration,
    next_generation: AtomicU64,
    on_empty: EmptyCallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingTimer {
    pub server_id: String,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

/// Tracks one countdown per server. A countdown starts on the first empty
/// observation, is dropped on the first occupied one, and otherwise calls
/// `on_empty` once when `delay` runs out.
#[derive(Clone)]
pub struct EmptyServerMonitor {
    inner: Arc<Inner>,
}

impl EmptyServerMonitor {
    pub fn new<F>(delay: Duration, on_empty: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                timers: DashMap::new(),
                delay,
                next_generation: AtomicU64::new(0),
                on_empty: Box::new(on_empty),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Must be called from within a tokio runtime; expiry runs on a spawned task.
    pub fn report_occupancy(&self, server_id: &str, occupied: bool) {
        if occupied {
            self.cancel(server_id);
        } else {
            self.arm(server_id);
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self, server_id: &str) -> bool {
        self.inner.timers.contains_key(server_id)
    }

    pub fn pending(&self) -> Vec<PendingTimer> {
        let now = Instant::now();
        self.inner
            .timers
            .iter()
            .map(|entry| {
                let elapsed = now.saturating_duration_since(entry.started_at);
                PendingTimer {
                    server_id: entry.key().clone(),
                    elapsed_secs: elapsed.as_secs(),
                    remaining_secs: self.inner.delay.saturating_sub(elapsed).as_secs(),
                }
            })
            .collect()
    }

    /// Drops every countdown without notifying.
    pub fn shutdown(&self) {
        self.inner.timers.retain(|server_id, timer| {
            debug!("Dropping empty timer for {} on shutdown", server_id);
            timer.handle.abort();
            false
        });
    }

    fn arm(&self, server_id: &str) {
        match self.inner.timers.entry(server_id.to_string()) {
            Entry::Occupied(_) => {
                debug!("Empty timer for {} already running", server_id);
            }
            Entry::Vacant(slot) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let weak = Arc::downgrade(&self.inner);
                let id = server_id.to_string();
                let delay = self.inner.delay;

                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    expire(weak, &id, generation);
                });

                slot.insert(EmptyTimer {
                    generation,
                    started_at: Instant::now(),
                    handle,
                });
                info!(
                    "Server {} is empty, notifying in {}s unless someone joins",
                    server_id,
                    delay.as_secs()
                );
            }
        }
    }

    fn cancel(&self, server_id: &str) {
        if let Some((_, timer)) = self.inner.timers.remove(server_id) {
            timer.handle.abort();
            info!("Server {} is occupied again, empty timer cancelled", server_id);
        }
    }
}

/// The record is only removed if it still belongs to this timer's generation.
/// Whoever removes it first wins: a cancel that got there first means no
/// notification.
fn expire(inner: Weak<Inner>, server_id: &str, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let removed = inner
        .timers
        .remove_if(server_id, |_, timer| timer.generation == generation);

    if removed.is_none() {
        debug!("Stale empty timer for {} (generation {})", server_id, generation);
        return;
    }

    info!("Server {} stayed empty for {}s", server_id, inner.delay.as_secs());
    (inner.on_empty)(server_id.to_string());
}
