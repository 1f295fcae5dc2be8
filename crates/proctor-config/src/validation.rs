//! Configuration validation

use crate::schema::RawConfig;
use proctor_api::ViolationType;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Throttle for {violation} must be non-negative, got {value}ms")]
    NegativeThrottle { violation: String, value: i64 },

    #[error("sample_interval_ms must be greater than zero")]
    ZeroSampleInterval,

    #[error("Every check is disabled")]
    NoChecksEnabled,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Unknown keys are not errors here; they are dropped with a warning
    // when the config is converted.
    for (key, &value) in &config.throttle {
        if value < 0 {
            errors.push(ValidationError::NegativeThrottle {
                violation: key.clone(),
                value,
            });
        }
    }

    if config.service.sample_interval_ms == Some(0) {
        errors.push(ValidationError::ZeroSampleInterval);
    }

    let checks = &config.checks;
    let any_enabled = [
        checks.face_detection,
        checks.fullscreen,
        checks.tab_switch,
        checks.copy_paste,
        checks.multiple_screens,
    ]
    .into_iter()
    .any(|c| c.unwrap_or(true));
    if !any_enabled {
        errors.push(ValidationError::NoChecksEnabled);
    }

    errors
}

/// Parse a throttle key into a violation type
pub fn parse_violation_key(key: &str) -> Option<ViolationType> {
    key.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawChecks, RawServiceConfig};
    use std::collections::BTreeMap;

    fn raw(throttle: &[(&str, i64)]) -> RawConfig {
        RawConfig {
            config_version: 1,
            service: RawServiceConfig::default(),
            checks: RawChecks::default(),
            throttle: throttle
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = raw(&[("NO_FACE", 1000), ("TAB_SWITCH", 0)]);
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_negative_throttle() {
        let config = raw(&[("NO_FACE", 1000), ("COPY_PASTE_ATTEMPT", -5)]);
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::NegativeThrottle { violation, value: -5 } if violation == "COPY_PASTE_ATTEMPT"
        ));
    }

    #[test]
    fn test_unknown_key_is_not_an_error() {
        let config = raw(&[("EYES_CLOSED", 100)]);
        assert!(validate_config(&config).is_empty());
        assert_eq!(parse_violation_key("EYES_CLOSED"), None);
        assert_eq!(parse_violation_key("MULTIPLE_FACES"), Some(ViolationType::MultipleFaces));
    }

    #[test]
    fn test_zero_sample_interval() {
        let mut config = raw(&[]);
        config.service.sample_interval_ms = Some(0);
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroSampleInterval)));
    }

    #[test]
    fn test_all_checks_disabled() {
        let mut config = raw(&[]);
        config.checks = RawChecks {
            face_detection: Some(false),
            fullscreen: Some(false),
            tab_switch: Some(false),
            copy_paste: Some(false),
            multiple_screens: Some(false),
        };
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NoChecksEnabled)));
    }
}
