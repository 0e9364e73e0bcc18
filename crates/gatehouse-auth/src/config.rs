//! Authentication configuration.
//!
//! Token lifetimes and the access-token signing key. The service refuses
//! to start half-configured: [`AuthConfig::validate`] rejects a missing
//! signing key or zero lifetimes, whatever configuration source the host
//! process wires in.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! signing_key = "change-me"
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "14d"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Authentication service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key used to sign access-token claims (HS256).
    pub signing_key: String,

    /// Access token lifetime.
    /// Shorter lifetimes are more secure but require more frequent refresh.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            access_token_lifetime: Duration::from_secs(3600), // 1 hour
            refresh_token_lifetime: Duration::from_secs(14 * 24 * 3600), // 14 days
        }
    }
}

impl AuthConfig {
    /// Creates a configuration with the given signing key and the default
    /// lifetimes.
    #[must_use]
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
            ..Self::default()
        }
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the signing key is empty or either
    /// lifetime is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }

        if self.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidLifetime {
                field: "access_token_lifetime",
            });
        }

        if self.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidLifetime {
                field: "refresh_token_lifetime",
            });
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The signing key is not set.
    #[error("signing key must be set")]
    MissingSigningKey,

    /// A token lifetime is zero.
    #[error("{field} must be greater than zero")]
    InvalidLifetime {
        /// The offending configuration field.
        field: &'static str,
    },
}
