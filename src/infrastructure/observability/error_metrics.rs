use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::application::ports::ErrorMetrics;

/// Counter key: status, path, method
type MetricKey = (u16, String, String);

/// Distinct keys kept before new ones fold into the overflow row
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// Path and method of the row that absorbs keys past the cap
pub const OVERFLOW_LABEL: &str = "<overflow>";

/// One row of the error counter table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub status: u16,
    pub path: String,
    pub method: String,
    pub count: u64,
}

/// Error counters held in memory, keyed by status, path and method
#[derive(Debug, Clone)]
pub struct InMemoryErrorMetrics {
    counters: Arc<DashMap<MetricKey, u64>>,
    max_keys: usize,
}

impl Default for InMemoryErrorMetrics {
    fn default() -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl InMemoryErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    fn key_for(&self, status: u16, path: &str, method: &str) -> MetricKey {
        let key = (status, path.to_string(), method.to_string());
        if self.counters.contains_key(&key) || self.counters.len() < self.max_keys {
            return key;
        }
        (status, OVERFLOW_LABEL.to_string(), OVERFLOW_LABEL.to_string())
    }

    pub fn count(&self, status: u16, path: &str, method: &str) -> u64 {
        self.counters
            .get(&(status, path.to_string(), method.to_string()))
            .map(|entry| *entry)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counters.iter().map(|entry| *entry.value()).sum()
    }

    /// Total errors per status class (4 for 4xx, 5 for 5xx)
    pub fn total_for_class(&self, class: u16) -> u64 {
        self.counters
            .iter()
            .filter(|entry| entry.key().0 / 100 == class)
            .map(|entry| *entry.value())
            .sum()
    }

    /// All counters, sorted by status then path then method
    pub fn snapshot(&self) -> Vec<ErrorCount> {
        let mut rows: Vec<ErrorCount> = self
            .counters
            .iter()
            .map(|entry| {
                let (status, path, method) = entry.key().clone();
                ErrorCount {
                    status,
                    path,
                    method,
                    count: *entry.value(),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.status, &a.path, &a.method).cmp(&(b.status, &b.path, &b.method))
        });
        rows
    }

    pub fn reset(&self) {
        self.counters.clear();
    }
}

impl ErrorMetrics for InMemoryErrorMetrics {
    fn increment(&self, status: u16, path: &str, method: &str) {
        let key = self.key_for(status, path, method);
        let mut counter = self.counters.entry(key).or_insert(0);
        *counter += 1;

        debug!(
            status = status,
            path = %path,
            method = %method,
            count = *counter,
            "error_counted"
        );
    }
}
