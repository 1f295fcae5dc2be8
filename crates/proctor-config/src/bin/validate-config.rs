//! Config validation CLI tool
//!
//! Validates a proctor configuration file and reports any errors.

use proctor_api::ViolationType;
use proctor_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a proctor configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match proctor_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", proctor_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Sample interval: {}ms",
                policy.service.sample_interval.as_millis()
            );

            let checks = policy.checks;
            println!();
            println!("Checks:");
            println!("  face_detection:   {}", on_off(checks.face_detection));
            println!("  fullscreen:       {}", on_off(checks.fullscreen));
            println!("  tab_switch:       {}", on_off(checks.tab_switch));
            println!("  copy_paste:       {}", on_off(checks.copy_paste));
            println!("  multiple_screens: {}", on_off(checks.multiple_screens));

            println!();
            println!("Throttles:");
            for kind in ViolationType::ALL {
                println!("  {:<20} {}ms", kind, policy.throttles.get(kind).as_millis());
            }

            if !policy.ignored_throttle_keys.is_empty() {
                println!();
                println!("Ignored throttle keys:");
                for key in &policy.ignored_throttle_keys {
                    println!("  - {}", key);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                proctor_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                proctor_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                proctor_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                proctor_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        proctor_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
