//! Failure modes of configuration loading.

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Everything that can go wrong between a YAML file and a validated
/// [`OvningConfig`](crate::OvningConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist on disk.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The merged configuration broke a range or nesting rule.
    #[error("invalid configuration: {}", flatten_validation(.0))]
    Validation(#[source] ValidationErrors),

    /// The layered sources could not be parsed or merged.
    #[error("configuration could not be read: {0}")]
    Parsing(#[from] figment::Error),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

/// Renders validation failures as one `field: reason, reason` clause per
/// field, semicolon-joined and sorted so the message is stable.
fn flatten_validation(errors: &ValidationErrors) -> String {
    let mut clauses: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let reasons: Vec<String> = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect();
    clauses.sort();
    clauses.join("; ")
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::ConfigError;
    use crate::EngineConfig;

    #[test]
    fn validation_message_names_the_offending_field() {
        let bad = EngineConfig {
            snapshot_capacity: 1,
            ..Default::default()
        };
        let err = ConfigError::from(bad.validate().unwrap_err());
        assert!(err.to_string().contains("snapshot_capacity"));
    }
}
