use std::{path::Path, time::Duration};

use jsonwebtoken::Algorithm;
use serde::Deserialize;

use keystone_types::{Error, Result};

/// Algorithm used to sign application tokens.
pub const APPLICATION_TOKEN_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Shortest TTL a user certificate may be issued with.
pub const MIN_CERT_DURATION: Duration = Duration::from_secs(60);

fn default_jwt_algorithm() -> Algorithm {
    APPLICATION_TOKEN_ALGORITHM
}

fn default_min_cert_duration_secs() -> u64 {
    MIN_CERT_DURATION.as_secs()
}

/// Tunables threaded through validation and token operations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorityConfig {
    /// Algorithm tag JWT signer CAs are validated and signed with.
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: Algorithm,

    #[serde(default = "default_min_cert_duration_secs")]
    pub min_cert_duration_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            jwt_algorithm: default_jwt_algorithm(),
            min_cert_duration_secs: default_min_cert_duration_secs(),
        }
    }
}

impl AuthorityConfig {
    /// Reads the configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::wrap(format!("failed to read config file {}", path.display()), e)
        })?;
        Self::from_toml(&contents)
            .map_err(|e| Error::wrap(format!("failed to parse config file {}", path.display()), e))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::bad_parameter(e.to_string()))
    }

    pub fn min_cert_duration(&self) -> Duration {
        Duration::from_secs(self.min_cert_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AuthorityConfig::from_toml("").unwrap();
        assert_eq!(config, AuthorityConfig::default());
        assert_eq!(config.jwt_algorithm, Algorithm::EdDSA);
        assert_eq!(config.min_cert_duration(), MIN_CERT_DURATION);
    }

    #[test]
    fn test_overrides() {
        let config = AuthorityConfig::from_toml(
            r#"
            jwt_algorithm = "RS256"
            min_cert_duration_secs = 300
            "#,
        )
        .unwrap();
        assert_eq!(config.jwt_algorithm, Algorithm::RS256);
        assert_eq!(config.min_cert_duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(AuthorityConfig::from_toml(r#"jwt_algorithm = "ROT13""#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AuthorityConfig::from_file("/nonexistent/keystone.toml").unwrap_err();
        assert!(err.is_wrapped());
    }
}
