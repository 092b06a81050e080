//! # övning Configuration System
//!
//! Hierarchical configuration for the training-scenario engine.
//!
//! ## Features
//! - **Unified Configuration**: single source of truth across all components
//! - **Validation**: runtime validation of critical parameters
//! - **Environment Awareness**: per-environment override files

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod engine;
mod error;
mod telemetry;

pub use engine::EngineConfig;
pub use error::ConfigError;
pub use telemetry::TelemetryConfig;

/// Top-level configuration container for all övning components.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct OvningConfig {
    /// Engine parameters (snapshot fan-out, session limits).
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Telemetry and observability configuration.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl OvningConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/ovning.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `OVNING_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(OvningConfig::default()));

        if Path::new("config/ovning.yaml").exists() {
            figment = figment.merge(Yaml::file("config/ovning.yaml"));
        }

        let env = std::env::var("OVNING_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("OVNING_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("OVNING_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_validation() {
        let config = OvningConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn environment_override() {
        std::env::set_var("OVNING_ENGINE__SNAPSHOT_CAPACITY", "1024");
        let config = OvningConfig::load().unwrap();
        assert_eq!(config.engine.snapshot_capacity, 1024);
        std::env::remove_var("OVNING_ENGINE__SNAPSHOT_CAPACITY");
    }
}
