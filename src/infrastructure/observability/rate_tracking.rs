use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::ports::RateLimitTracker;

/// Sliding window used to flag clients that keep producing errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTrackingConfig {
    /// Errors within the window before a client is flagged
    pub errors_per_window: u32,
    /// Window duration in seconds
    pub window_seconds: u64,
}

impl Default for RateTrackingConfig {
    fn default() -> Self {
        Self {
            errors_per_window: 50,
            window_seconds: 60,
        }
    }
}

/// Per-client error timestamps held in memory
#[derive(Debug, Clone)]
pub struct InMemoryRateLimitTracker {
    config: Arc<RateTrackingConfig>,
    // Client IP -> recent error times, oldest first
    clients: Arc<DashMap<String, VecDeque<Instant>>>,
}

impl Default for InMemoryRateLimitTracker {
    fn default() -> Self {
        Self::new(RateTrackingConfig::default())
    }
}

impl InMemoryRateLimitTracker {
    pub fn new(config: RateTrackingConfig) -> Self {
        Self {
            config: Arc::new(config),
            clients: Arc::new(DashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// Errors recorded for `client_ip` within the current window, at most `errors_per_window`
    pub fn errors_in_window(&self, client_ip: &str) -> usize {
        let now = Instant::now();
        let window = self.window();
        self.clients
            .get(client_ip)
            .map(|times| {
                times
                    .iter()
                    .filter(|time| now.duration_since(**time) < window)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_flagged(&self, client_ip: &str) -> bool {
        self.errors_in_window(client_ip) >= self.config.errors_per_window as usize
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Drop clients with no errors inside the window
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window();
        self.clients.retain(|_, times| {
            while let Some(&oldest) = times.front() {
                if now.duration_since(oldest) >= window {
                    times.pop_front();
                } else {
                    break;
                }
            }
            !times.is_empty()
        });
    }
}

impl RateLimitTracker for InMemoryRateLimitTracker {
    fn track(&self, client_ip: &str, path: &str) {
        let now = Instant::now();
        let window = self.window();
        let mut times = self.clients.entry(client_ip.to_string()).or_default();

        // Remove old errors outside the window
        while let Some(&oldest) = times.front() {
            if now.duration_since(oldest) >= window {
                times.pop_front();
            } else {
                break;
            }
        }

        // Only the newest `errors_per_window` entries matter for flagging
        let limit = (self.config.errors_per_window as usize).max(1);
        let was_flagged = times.len() >= limit;
        while times.len() >= limit {
            times.pop_front();
        }
        times.push_back(now);

        if !was_flagged && times.len() == limit {
            warn!(
                client_ip = %client_ip,
                path = %path,
                errors = times.len(),
                window_seconds = self.config.window_seconds,
                "client_error_rate_exceeded"
            );
        }
    }
}
