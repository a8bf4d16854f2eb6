//! Configuration loading from disk.

use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minimal_toml() {
        let raw = r#"
            [gateway]
            url = "https://gateway.example:6443"

            [[clusters]]
            name = "prod"
            bearer_token = "abc123"

            [clusters.extra_headers]
            x-tenant = "team-a"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.gateway.url, "https://gateway.example:6443");
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.clusters[0].name, "prod");
        assert_eq!(
            config.clusters[0].extra_headers.get("x-tenant"),
            Some(&"team-a".to_string())
        );
        assert!(validate_config(&config).is_ok());
    }
}
