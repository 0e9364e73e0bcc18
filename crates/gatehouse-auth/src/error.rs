//! Authentication and account directory error types.
//!
//! This module defines all error types that can occur during credential
//! validation, grant processing, and user directory operations.
//!
//! # Error Design
//!
//! Errors fall into four buckets:
//!
//! - **Input errors**: missing or malformed request fields, surfaced
//!   verbatim to the caller.
//! - **Enumeration-resistant errors**: credential and client lookup
//!   failures deliberately collapsed to generic messages so callers cannot
//!   probe which client IDs or usernames exist.
//! - **State errors**: expired or locked conditions with specific
//!   messages (not exploitable for enumeration).
//! - **Infrastructure errors**: storage, signing, and queue failures,
//!   logged with detail server-side and surfaced opaquely.

use std::fmt;

/// Errors that can occur during authentication and directory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request's `grant_type` is not one of the supported grants.
    #[error("invalid grant type")]
    InvalidGrantType,

    /// The request is missing `client_id` or `client_secret`.
    #[error("client ID or secret cannot be empty")]
    EmptyClientOrSecret,

    /// The client is unknown or the secret does not match.
    ///
    /// Unknown client and wrong secret intentionally produce this same
    /// value to prevent client-ID enumeration.
    #[error("invalid client ID or secret")]
    InvalidClientOrSecret,

    /// The username is unknown or the password does not match.
    ///
    /// Unknown username and wrong password intentionally produce this same
    /// value to prevent username enumeration.
    #[error("invalid username or password")]
    InvalidUsernameOrPassword,

    /// The account has no password hash set.
    ///
    /// Distinct from a credential mismatch: this indicates a provisioning
    /// defect, not a guess.
    #[error("user password not set")]
    UserPasswordNotSet,

    /// The user could not be found.
    #[error("user not found")]
    UserNotFound,

    /// The account is locked and cannot perform confirmation operations.
    #[error("user account is locked")]
    UserLocked,

    /// The password reset code has already been used or has expired.
    #[error("password reset code already used or expired")]
    PasswordResetExpired,

    /// The request's `refresh_token` field is empty or missing.
    #[error("refresh token is empty or missing")]
    RefreshTokenEmpty,

    /// No refresh token with that value exists for this client.
    #[error("refresh token not found")]
    RefreshTokenNotFound,

    /// The refresh token exists but has passed its expiry.
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// The auth client registration could not be found.
    ///
    /// Storage-level outcome; the grant service collapses it into
    /// [`AuthError::InvalidClientOrSecret`] before it reaches a caller.
    #[error("auth client could not be found")]
    ClientNotFound,

    /// No token row matched the lookup.
    #[error("token not found")]
    TokenNotFound,

    /// Access token signing failed.
    #[error("token signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// Password hashing failed.
    #[error("password hashing error: {message}")]
    Hashing {
        /// Description of the hashing failure.
        message: String,
    },

    /// An error occurred while reading or writing persistent state.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The notification queue rejected an enqueue.
    #[error("queue error: {message}")]
    Queue {
        /// Description of the queue error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a new `Hashing` error.
    #[must_use]
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Queue` error.
    #[must_use]
    pub fn queue(message: impl Into<String>) -> Self {
        Self::Queue {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Signing { .. }
                | Self::Hashing { .. }
                | Self::Storage { .. }
                | Self::Queue { .. }
                | Self::Configuration { .. }
        )
    }

    /// Returns `true` if this error deliberately hides whether the looked-up
    /// identity exists.
    #[must_use]
    pub fn is_enumeration_resistant(&self) -> bool {
        matches!(
            self,
            Self::InvalidClientOrSecret | Self::InvalidUsernameOrPassword
        )
    }

    /// Returns the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidGrantType | Self::EmptyClientOrSecret | Self::RefreshTokenEmpty => {
                ErrorCategory::Validation
            }
            Self::InvalidClientOrSecret
            | Self::InvalidUsernameOrPassword
            | Self::UserPasswordNotSet
            | Self::ClientNotFound => ErrorCategory::Authentication,
            Self::UserNotFound | Self::TokenNotFound => ErrorCategory::Lookup,
            Self::UserLocked
            | Self::PasswordResetExpired
            | Self::RefreshTokenNotFound
            | Self::RefreshTokenExpired => ErrorCategory::State,
            Self::Signing { .. }
            | Self::Hashing { .. }
            | Self::Storage { .. }
            | Self::Queue { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the HTTP status code an HTTP boundary should map this to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidGrantType | Self::EmptyClientOrSecret | Self::RefreshTokenEmpty => 400,
            Self::InvalidClientOrSecret
            | Self::InvalidUsernameOrPassword
            | Self::UserPasswordNotSet => 401,
            Self::UserNotFound | Self::ClientNotFound | Self::TokenNotFound => 404,
            Self::UserLocked
            | Self::PasswordResetExpired
            | Self::RefreshTokenNotFound
            | Self::RefreshTokenExpired => 422,
            Self::Signing { .. }
            | Self::Hashing { .. }
            | Self::Storage { .. }
            | Self::Queue { .. }
            | Self::Configuration { .. } => 500,
        }
    }
}

/// Categories of auth/directory errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Credential verification errors.
    Authentication,
    /// Entity lookup errors.
    Lookup,
    /// Expired/locked/already-used state errors.
    State,
    /// Storage, signing, and queue errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Lookup => write!(f, "lookup"),
            Self::State => write!(f, "state"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::InvalidClientOrSecret.to_string(),
            "invalid client ID or secret"
        );
        assert_eq!(
            AuthError::EmptyClientOrSecret.to_string(),
            "client ID or secret cannot be empty"
        );
        assert_eq!(
            AuthError::RefreshTokenExpired.to_string(),
            "refresh token expired"
        );
        assert_eq!(
            AuthError::storage("database down").to_string(),
            "storage error: database down"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::InvalidUsernameOrPassword.is_client_error());
        assert!(!AuthError::InvalidUsernameOrPassword.is_server_error());
        assert!(AuthError::InvalidUsernameOrPassword.is_enumeration_resistant());

        assert!(AuthError::storage("down").is_server_error());
        assert!(!AuthError::storage("down").is_client_error());
        assert!(!AuthError::storage("down").is_enumeration_resistant());

        assert!(AuthError::UserPasswordNotSet.is_client_error());
        assert!(!AuthError::UserPasswordNotSet.is_enumeration_resistant());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::InvalidGrantType.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::InvalidClientOrSecret.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::RefreshTokenExpired.category(),
            ErrorCategory::State
        );
        assert_eq!(
            AuthError::signing("no key").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            AuthError::configuration("bad").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(AuthError::InvalidGrantType.http_status(), 400);
        assert_eq!(AuthError::EmptyClientOrSecret.http_status(), 400);
        assert_eq!(AuthError::InvalidClientOrSecret.http_status(), 401);
        assert_eq!(AuthError::InvalidUsernameOrPassword.http_status(), 401);
        assert_eq!(AuthError::RefreshTokenExpired.http_status(), 422);
        assert_eq!(AuthError::storage("down").http_status(), 500);
    }

    #[test]
    fn test_error_equality_for_collapsed_lookups() {
        // Unknown client and wrong secret must be indistinguishable values.
        let unknown = AuthError::InvalidClientOrSecret;
        let mismatch = AuthError::InvalidClientOrSecret;
        assert_eq!(unknown, mismatch);
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::State.to_string(), "state");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
