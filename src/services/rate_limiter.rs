use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, info};

use crate::config::RateLimitConfig;

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

/// Sliding-window limiter with an exact per-client count.
///
/// Each client keeps the instants of its admitted requests, oldest first.
/// A request is admitted when fewer than `limit` of those are younger than
/// `window`. An entry exactly `window` old has expired.
///
/// Clients live in a sharded map; the prune-check-append for one client
/// runs under its shard's write lock, so concurrent calls for the same
/// client cannot both slip under the limit, while most calls for other
/// clients proceed on other shards.
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    clients: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admission check against the current time.
    pub fn admit(&self, client_id: &str) -> Admission {
        self.admit_at(client_id, Instant::now())
    }

    pub fn admit_at(&self, client_id: &str, now: Instant) -> Admission {
        let mut timestamps = self.clients.entry(client_id.to_owned()).or_default();

        // Keep the sequence ordered even if callers read the clock out of order
        let now = timestamps.back().map_or(now, |&last| last.max(now));
        prune(&mut timestamps, now, self.window);

        if timestamps.len() >= self.limit {
            debug!(
                "Rejecting '{}': {} requests within {:?}",
                client_id,
                timestamps.len(),
                self.window
            );
            return Admission::Rejected;
        }

        timestamps.push_back(now);
        Admission::Admitted
    }

    /// Drops clients with no request younger than the window. Returns how
    /// many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, timestamps| {
            prune(timestamps, now, self.window);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.clients.len())
    }

    /// Number of clients currently holding state
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Sweeps every `period` on the current runtime for as long as the
    /// limiter is alive.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let removed = limiter.sweep(Instant::now());
                if removed > 0 {
                    info!(
                        "Rate limiter sweep removed {} idle clients, {} remain",
                        removed,
                        limiter.tracked_clients()
                    );
                }
            }
        })
    }
}

// Timestamps are in insertion order, so expired ones form a prefix
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
