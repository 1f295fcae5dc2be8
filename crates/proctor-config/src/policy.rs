//! Validated proctoring policy

use crate::schema::{RawChecks, RawConfig, RawServiceConfig};
use crate::validation::parse_violation_key;
use proctor_api::{EnabledChecks, ThrottleTable};
use std::time::Duration;
use tracing::warn;

/// Default face sampling interval, roughly one animation frame at 60Hz
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(16);

/// Validated policy ready for use by a session
#[derive(Debug, Clone)]
pub struct Policy {
    /// Service configuration
    pub service: ServiceConfig,

    /// Checks to run
    pub checks: EnabledChecks,

    /// Effective throttle windows (recommended defaults plus overrides)
    pub throttles: ThrottleTable,

    /// Throttle keys that named no known violation type
    pub ignored_throttle_keys: Vec<String>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let mut throttles = ThrottleTable::recommended();
        let mut ignored_throttle_keys = Vec::new();

        for (key, ms) in raw.throttle {
            match parse_violation_key(&key) {
                Some(kind) => {
                    // Negative values were rejected by validation
                    throttles.set(kind, Duration::from_millis(ms.max(0) as u64));
                }
                None => {
                    warn!(key = %key, "Ignoring throttle for unknown violation type");
                    ignored_throttle_keys.push(key);
                }
            }
        }

        Self {
            service: ServiceConfig::from_raw(raw.service),
            checks: convert_checks(raw.checks),
            throttles,
            ignored_throttle_keys,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            checks: EnabledChecks::all(),
            throttles: ThrottleTable::recommended(),
            ignored_throttle_keys: Vec::new(),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub sample_interval: Duration,
    pub log_level: Option<String>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            sample_interval: raw
                .sample_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            log_level: raw.log_level,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            log_level: None,
        }
    }
}

fn convert_checks(raw: RawChecks) -> EnabledChecks {
    EnabledChecks {
        face_detection: raw.face_detection.unwrap_or(true),
        fullscreen: raw.fullscreen.unwrap_or(true),
        tab_switch: raw.tab_switch.unwrap_or(true),
        copy_paste: raw.copy_paste.unwrap_or(true),
        multiple_screens: raw.multiple_screens.unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_api::ViolationType;
    use std::collections::BTreeMap;

    #[test]
    fn test_overrides_merge_over_recommended() {
        let mut throttle = BTreeMap::new();
        throttle.insert("NO_FACE".to_string(), 1000);
        throttle.insert("BLINKING".to_string(), 50);

        let policy = Policy::from_raw(RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            checks: RawChecks::default(),
            throttle,
        });

        assert_eq!(policy.throttles.get(ViolationType::NoFace), Duration::from_millis(1000));
        assert_eq!(
            policy.throttles.get(ViolationType::MultipleScreens),
            Duration::from_millis(10000)
        );
        assert_eq!(policy.ignored_throttle_keys, vec!["BLINKING".to_string()]);
    }

    #[test]
    fn test_checks_default_to_enabled() {
        let checks = convert_checks(RawChecks {
            tab_switch: Some(false),
            ..Default::default()
        });
        assert!(checks.face_detection);
        assert!(!checks.tab_switch);
        assert!(checks.multiple_screens);
    }

    #[test]
    fn test_default_policy() {
        let policy = Policy::default();
        assert_eq!(policy.service.sample_interval, DEFAULT_SAMPLE_INTERVAL);
        assert_eq!(policy.throttles, ThrottleTable::recommended());
    }
}
