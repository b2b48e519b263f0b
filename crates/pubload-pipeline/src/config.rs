//! Configuration for the Pipeline
//!
//! Decides what happens when a record fails and how hard transient storage
//! failures are retried.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reaction to a record that cannot be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure, skip the record, keep going
    #[default]
    Continue,

    /// Stop the run at the first failed record; earlier commits stay
    Abort,
}

/// Configuration for the Pipeline
///
/// # Examples
///
/// ```
/// use pubload_pipeline::{ErrorPolicy, PipelineConfig};
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.error_policy, ErrorPolicy::Continue);
///
/// let config = PipelineConfig::strict();
/// assert_eq!(config.error_policy, ErrorPolicy::Abort);
/// assert_eq!(config.max_retries, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// What to do when a record fails
    pub error_policy: ErrorPolicy,

    /// Retries for a transient storage failure before the record is given up
    pub max_retries: u32,

    /// Backoff step; attempt `n` waits `n * retry_backoff_ms`
    pub retry_backoff_ms: u64,

    /// Stop once more than this many records have been skipped
    pub skip_limit: Option<u64>,

    /// Log progress every this many elements
    pub progress_interval: u64,
}

impl Default for PipelineConfig {
    /// Continue past bad records, retry busy storage three times
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Continue,
            max_retries: 3,
            retry_backoff_ms: 200,
            skip_limit: None,
            progress_interval: 10_000,
        }
    }
}

impl PipelineConfig {
    /// Strict preset: first failure aborts, no retries
    pub fn strict() -> Self {
        Self {
            error_policy: ErrorPolicy::Abort,
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Lenient preset: longer retry budget for a shared, busy database
    pub fn lenient() -> Self {
        Self {
            max_retries: 10,
            retry_backoff_ms: 500,
            ..Self::default()
        }
    }

    /// Wait before retry number `attempt` (1-based)
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_interval == 0 {
            return Err("progress_interval must be greater than 0".to_string());
        }
        if self.max_retries > 100 {
            return Err(format!("max_retries {} is unreasonably large (max 100)", self.max_retries));
        }
        if self.retry_backoff_ms > 60_000 {
            return Err("retry_backoff_ms cannot exceed 60000".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.error_policy, ErrorPolicy::Continue);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.skip_limit, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(PipelineConfig::strict().validate().is_ok());
        assert!(PipelineConfig::lenient().validate().is_ok());
        assert!(PipelineConfig::lenient().max_retries > PipelineConfig::default().max_retries);
    }

    #[test]
    fn test_linear_backoff() {
        let config = PipelineConfig::default();
        assert_eq!(config.retry_backoff(1), Duration::from_millis(200));
        assert_eq!(config.retry_backoff(3), Duration::from_millis(600));
    }

    #[test]
    fn test_invalid_progress_interval() {
        let mut config = PipelineConfig::default();
        config.progress_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_parses_lowercase() {
        let config = PipelineConfig::from_toml("error_policy = \"abort\"\nskip_limit = 5").unwrap();
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.skip_limit, Some(5));
        assert_eq!(config.progress_interval, 10_000);

        assert!(PipelineConfig::from_toml("error_policy = \"explode\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::strict();
        config.skip_limit = Some(42);
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
