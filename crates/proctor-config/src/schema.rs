//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Which checks to run
    #[serde(default)]
    pub checks: RawChecks,

    /// Throttle windows in milliseconds, keyed by violation type name
    #[serde(default)]
    pub throttle: BTreeMap<String, i64>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Face sampling interval (default: 16ms, roughly one animation frame)
    pub sample_interval_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    pub log_level: Option<String>,
}

/// Check toggles. Omitted checks are enabled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawChecks {
    pub face_detection: Option<bool>,
    pub fullscreen: Option<bool>,
    pub tab_switch: Option<bool>,
    pub copy_paste: Option<bool>,
    pub multiple_screens: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [service]
            sample_interval_ms = 33
            log_level = "debug"

            [checks]
            copy_paste = false

            [throttle]
            NO_FACE = 2500
            TAB_SWITCH = 0
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.sample_interval_ms, Some(33));
        assert_eq!(config.checks.copy_paste, Some(false));
        assert_eq!(config.checks.fullscreen, None);
        assert_eq!(config.throttle.get("NO_FACE"), Some(&2500));
    }

    #[test]
    fn parse_negative_throttle() {
        let toml_str = r#"
            config_version = 1

            [throttle]
            FULLSCREEN_EXIT = -10
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.throttle.get("FULLSCREEN_EXIT"), Some(&-10));
    }
}
