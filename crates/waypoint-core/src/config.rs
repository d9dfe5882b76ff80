//! Router configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Policy knobs for one router instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Per-task wall-clock budget in seconds
    pub task_timeout_secs: u64,
    /// How many recent turns a snapshot carries
    pub history_window: usize,
    /// Region hint passed to lookup agents ("함안" for the pilot deployment)
    pub default_region: Option<String>,
}

impl RouterConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-task timeout
    #[inline]
    #[must_use]
    pub fn with_task_timeout_secs(mut self, secs: u64) -> Self {
        self.task_timeout_secs = secs;
        self
    }

    /// With history window
    #[inline]
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// With default region
    #[inline]
    #[must_use]
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    /// Per-task budget as a `Duration`
    #[inline]
    #[must_use]
    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            task_timeout_secs: 30,
            history_window: 20,
            default_region: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RouterConfig::new();
        assert_eq!(config.task_timeout_secs, 30);
        assert_eq!(config.history_window, 20);
        assert!(config.default_region.is_none());
    }

    #[test]
    fn builder() {
        let config = RouterConfig::new()
            .with_task_timeout_secs(5)
            .with_history_window(3)
            .with_default_region("함안");

        assert_eq!(config.task_timeout(), Duration::from_secs(5));
        assert_eq!(config.history_window, 3);
        assert_eq!(config.default_region.as_deref(), Some("함안"));
    }
}
