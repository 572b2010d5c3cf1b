#[cfg(test)]
use mockall::automock;

/// Port for counting normalized errors
#[cfg_attr(test, automock)]
pub trait ErrorMetrics: Send + Sync {
    fn increment(&self, status: u16, path: &str, method: &str);
}
