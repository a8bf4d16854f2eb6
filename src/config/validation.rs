//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the gateway URL and routing prefix
//! - Validate cluster names as path segments
//! - Detect duplicate cluster entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::cluster::ClusterId;
use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("gateway.url {0:?} is not a valid URL")]
    GatewayUrl(String),

    #[error("gateway.url {0:?} must use http or https")]
    GatewayScheme(String),

    #[error("gateway.route_prefix {0:?} must start with '/' and not end with '/'")]
    RoutePrefix(String),

    #[error("clusters[{index}]: {source}")]
    ClusterName {
        index: usize,
        #[source]
        source: crate::cluster::InvalidClusterId,
    },

    #[error("clusters[{index}].url {url:?} is not a valid URL")]
    ClusterUrl { index: usize, url: String },

    #[error("cluster {0:?} is defined more than once")]
    DuplicateCluster(String),
}

/// Check everything serde cannot. Collects all problems before returning.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.gateway.url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::GatewayScheme(config.gateway.url.clone()));
            }
        }
        Err(_) => errors.push(ValidationError::GatewayUrl(config.gateway.url.clone())),
    }

    let prefix = &config.gateway.route_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::RoutePrefix(prefix.clone()));
    }

    let mut seen = HashSet::new();
    for (index, target) in config.clusters.iter().enumerate() {
        match ClusterId::new(&target.name) {
            Ok(_) => {
                if !seen.insert(target.name.clone()) {
                    errors.push(ValidationError::DuplicateCluster(target.name.clone()));
                }
            }
            Err(source) => errors.push(ValidationError::ClusterName { index, source }),
        }
        if let Some(url) = &target.url {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::ClusterUrl {
                    index,
                    url: url.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
