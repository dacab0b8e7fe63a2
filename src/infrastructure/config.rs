//! Loadable throttle limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throttle limits in a form that can be deserialized from application
/// configuration files.
///
/// Both fields are required; there are no defaults.
///
/// ```
/// use submit_throttle::ThrottleConfig;
/// use std::time::Duration;
///
/// let config: ThrottleConfig =
///     serde_json::from_str(r#"{"window_ms": 1000, "request_limit": 10}"#).unwrap();
/// assert_eq!(config.window(), Duration::from_secs(1));
/// assert_eq!(config.request_limit, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Length of the rolling window in milliseconds
    pub window_ms: u64,
    /// Maximum admissions per window
    pub request_limit: usize,
}

impl ThrottleConfig {
    /// Create a config from a window and a limit.
    pub fn new(window: impl Into<Duration>, request_limit: usize) -> Self {
        Self {
            window_ms: window.into().as_millis() as u64,
            request_limit,
        }
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::TimeUnit;

    #[test]
    fn test_from_time_unit() {
        let config = ThrottleConfig::new(TimeUnit::Minute, 100);
        assert_eq!(config.window_ms, 60_000);
        assert_eq!(config.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result: Result<ThrottleConfig, _> = serde_json::from_str(r#"{"window_ms": 1000}"#);
        assert!(result.is_err());
    }
}
