//! Router configuration.

use chrono::Duration;

/// Default minimum dwell between alighting one vehicle and boarding another.
pub const DEFAULT_MIN_TRANSFER_SECS: u32 = 180;

/// Configuration parameters for earliest-arrival search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Minimum time between alighting and boarding a different trip (seconds).
    /// Staying aboard the same trip needs no buffer.
    pub min_transfer_secs: u32,

    /// Maximum number of labels a single search may allocate.
    /// `None` means unbounded.
    pub max_labels: Option<usize>,
}

impl RouterConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(min_transfer_secs: u32, max_labels: Option<usize>) -> Self {
        Self {
            min_transfer_secs,
            max_labels,
        }
    }

    /// Returns the minimum transfer time as a Duration.
    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(i64::from(self.min_transfer_secs))
    }

    /// Returns a copy with a different transfer buffer.
    pub fn with_min_transfer_secs(&self, min_transfer_secs: u32) -> Self {
        Self {
            min_transfer_secs,
            ..self.clone()
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_transfer_secs: DEFAULT_MIN_TRANSFER_SECS,
            max_labels: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RouterConfig::default();

        assert_eq!(config.min_transfer_secs, 180);
        assert_eq!(config.max_labels, None);
    }

    #[test]
    fn duration_methods() {
        let config = RouterConfig::default();
        assert_eq!(config.min_transfer(), Duration::minutes(3));
    }

    #[test]
    fn custom_config() {
        let config = RouterConfig::new(60, Some(1000));

        assert_eq!(config.min_transfer_secs, 60);
        assert_eq!(config.max_labels, Some(1000));

        let relaxed = config.with_min_transfer_secs(0);
        assert_eq!(relaxed.min_transfer_secs, 0);
        assert_eq!(relaxed.max_labels, Some(1000));
    }
}
