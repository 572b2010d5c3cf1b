#[cfg(test)]
use mockall::automock;

/// Port notified of every error a client triggers
#[cfg_attr(test, automock)]
pub trait RateLimitTracker: Send + Sync {
    fn track(&self, client_ip: &str, path: &str);
}
