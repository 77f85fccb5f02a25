// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::{Result, TrackerError};

/// Smallest accepted override timeout.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
/// Largest accepted override timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60);
/// Default for both override timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for one tracker instance.
///
/// Immutable for the lifetime of a tracker, except that timeouts are
/// re-read through [`ConfigHandle`] on every override application, so a
/// reload is observed without restarting the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Entity id of the tracked alarm panel.
    pub panel_entity: String,
    /// How long a failed-to-arm override masks the derived state.
    pub failed_timeout: Duration,
    /// How long an incorrect-PIN override masks the derived state.
    pub pin_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            panel_entity: String::new(),
            failed_timeout: DEFAULT_TIMEOUT,
            pin_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// Reject out-of-bounds values before a tracker is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.panel_entity.is_empty() {
            return Err(TrackerError::MissingPanelEntity);
        }
        for (field, value) in [
            ("failed_timeout", self.failed_timeout),
            ("pin_timeout", self.pin_timeout),
        ] {
            if value < MIN_TIMEOUT || value > MAX_TIMEOUT {
                return Err(TrackerError::InvalidTimeout {
                    field,
                    value,
                    min: MIN_TIMEOUT,
                    max: MAX_TIMEOUT,
                });
            }
        }
        Ok(())
    }
}

/// Builder for TrackerConfig.
#[derive(Debug, Clone, Default)]
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    pub fn panel_entity(mut self, entity: impl Into<String>) -> Self {
        self.config.panel_entity = entity.into();
        self
    }

    pub fn failed_timeout(mut self, timeout: Duration) -> Self {
        self.config.failed_timeout = timeout;
        self
    }

    pub fn pin_timeout(mut self, timeout: Duration) -> Self {
        self.config.pin_timeout = timeout;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<TrackerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Shared, reloadable view of a tracker's configuration.
///
/// The tracker holds one of these and reads timeouts fresh at override
/// time; the composition root may swap in new values (e.g. on SIGHUP)
/// at any point.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<TrackerConfig>>,
}

impl ConfigHandle {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn get(&self) -> TrackerConfig {
        self.inner.read().await.clone()
    }

    /// Replace the configuration. The new values must already be
    /// validated; the panel entity of a live tracker does not change.
    pub async fn reload(&self, config: TrackerConfig) {
        *self.inner.write().await = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.failed_timeout, Duration::from_secs(2));
        assert_eq!(config.pin_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_builder() {
        let config = TrackerConfig::builder()
            .panel_entity("alarm_control_panel.alarmo")
            .failed_timeout(Duration::from_secs(5))
            .pin_timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(config.panel_entity, "alarm_control_panel.alarmo");
        assert_eq!(config.failed_timeout, Duration::from_secs(5));
        assert_eq!(config.pin_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_rejects_missing_entity() {
        let err = TrackerConfig::builder().build().unwrap_err();
        assert!(matches!(err, TrackerError::MissingPanelEntity));
    }

    #[test]
    fn test_config_rejects_out_of_bounds_timeouts() {
        let err = TrackerConfig::builder()
            .panel_entity("alarm_control_panel.alarmo")
            .failed_timeout(Duration::from_millis(500))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidTimeout {
                field: "failed_timeout",
                ..
            }
        ));

        let err = TrackerConfig::builder()
            .panel_entity("alarm_control_panel.alarmo")
            .pin_timeout(Duration::from_secs(61))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidTimeout {
                field: "pin_timeout",
                ..
            }
        ));
    }

    #[test]
    fn test_config_bounds_inclusive() {
        assert!(TrackerConfig::builder()
            .panel_entity("alarm_control_panel.alarmo")
            .failed_timeout(MIN_TIMEOUT)
            .pin_timeout(MAX_TIMEOUT)
            .build()
            .is_ok());
    }

    #[tokio::test]
    async fn test_config_handle_reload() {
        let handle = ConfigHandle::new(
            TrackerConfig::builder()
                .panel_entity("alarm_control_panel.alarmo")
                .build()
                .unwrap(),
        );
        assert_eq!(handle.get().await.pin_timeout, Duration::from_secs(2));

        let updated = TrackerConfig::builder()
            .panel_entity("alarm_control_panel.alarmo")
            .pin_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        handle.reload(updated).await;
        assert_eq!(handle.get().await.pin_timeout, Duration::from_secs(10));
    }
}
