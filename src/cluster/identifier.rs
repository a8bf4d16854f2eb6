//! Cluster identifier validation.
//!
//! # Responsibilities
//! - Represent the opaque name of a downstream cluster
//! - Reject names that cannot appear as a URL path segment
//!
//! # Design Decisions
//! - Validation happens at construction; a `ClusterId` in hand is always safe
//!   to splice into a request path without escaping
//! - Allowed charset is the RFC 3986 unreserved set (alphanumerics plus
//!   `-`, `.`, `_`, `~`), which covers DNS-style cluster names

use std::fmt;

use thiserror::Error;

/// Error returned when a cluster name fails path-segment validation.
///
/// An invalid name is never sent over the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid cluster identifier {name:?}: {reason}")]
pub struct InvalidClusterId {
    /// The rejected name, verbatim.
    pub name: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Validated name of a downstream cluster known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId(String);

impl ClusterId {
    /// Validate and wrap a cluster name.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidClusterId> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidClusterId {
                name,
                reason: "must not be empty",
            });
        }
        if let Some(bad) = name.chars().find(|c| !is_segment_safe(*c)) {
            let reason = match bad {
                '/' | '\\' => "must not contain a path separator",
                c if c.is_whitespace() => "must not contain whitespace",
                _ => "must contain only alphanumerics, '-', '.', '_' or '~'",
            };
            return Err(InvalidClusterId { name, reason });
        }
        Ok(Self(name))
    }

    /// The raw name as it appears in the rewritten path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ClusterId {
    type Err = InvalidClusterId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// RFC 3986 unreserved characters.
fn is_segment_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_dns_style_names() {
        for name in ["prod", "west-1", "cluster.example", "a_b~c"] {
            assert!(ClusterId::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_empty() {
        let err = ClusterId::new("").unwrap_err();
        assert_eq!(err.reason, "must not be empty");
    }

    #[test]
    fn test_rejects_path_separators_and_whitespace() {
        assert!(ClusterId::new("a/b").is_err());
        assert!(ClusterId::new("a\\b").is_err());
        assert!(ClusterId::new("a b").is_err());
        assert!(ClusterId::new("a\tb").is_err());
    }

    #[test]
    fn test_rejects_reserved_url_characters() {
        for name in ["a?b", "a#b", "a%2fb", "a:b"] {
            assert!(ClusterId::new(name).is_err(), "{name} should be rejected");
        }
    }
}
