//! User account domain type.
//!
//! The account record as the auth and directory services see it. Password
//! material is held as an Argon2 hash; validation never distinguishes a
//! missing hash from a wrong password, so lookups cannot be turned into a
//! provisioning-state oracle.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;

/// How long a password reset code stays valid.
///
/// The confirm flow is driven at the boundary; this constant is the single
/// source of the window it checks against.
pub const PASSWORD_RESET_WINDOW: Duration = Duration::hours(24);

/// Account roles.
pub mod role {
    /// Unrestricted operator account.
    pub const SUPER: &str = "super";
    /// Administrative account.
    pub const ADMIN: &str = "admin";
    /// API client account.
    pub const CLIENT: &str = "client";
    /// Manager account.
    pub const MANAGER: &str = "manager";
    /// Regular end-user account.
    pub const USER: &str = "user";
}

/// Account statuses.
pub mod status {
    /// Auto-created record, not yet touched.
    pub const INIT: i32 = 0;
    /// Record saved but not yet published.
    pub const DRAFT: i32 = 1;
    /// Fully active record.
    pub const ACTIVE: i32 = 2;
    /// Disabled record.
    pub const DISABLED: i32 = -1;
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,

    /// Given name.
    #[serde(default)]
    pub first_name: String,

    /// Family name.
    #[serde(default)]
    pub last_name: String,

    /// Email address; doubles as the login username.
    pub email: String,

    /// Whether the email address has been verified.
    #[serde(default)]
    pub verified: bool,

    /// Argon2 hash of the account password (None until one is set).
    ///
    /// Stored for persistence and cache round-trips; boundaries exposing
    /// users over the API must filter this field out.
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Pending password-reset code, if a reset was requested.
    #[serde(default)]
    pub password_reset_hash: Option<String>,

    /// Pending email-confirmation code, if one is outstanding.
    #[serde(default)]
    pub validation_hash: Option<String>,

    /// Account role, one of the [`role`] constants.
    #[serde(default)]
    pub role: String,

    /// Account status, one of the [`status`] constants.
    #[serde(default)]
    pub status: i32,

    /// Hard block on password-confirmation operations.
    #[serde(default)]
    pub locked: bool,

    /// Email-confirmed gate; inactive accounts cannot complete
    /// confirmation flows.
    #[serde(default)]
    pub is_active: bool,

    /// When the pending reset code was issued.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub password_reset_at: Option<OffsetDateTime>,

    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the account was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// When the account last completed a password grant.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    /// Creates a new account with the given email, no password, and the
    /// `user` role.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.into(),
            verified: false,
            password_hash: None,
            password_reset_hash: None,
            validation_hash: None,
            role: role::USER.to_string(),
            status: status::INIT,
            locked: false,
            is_active: false,
            password_reset_at: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// Hashes `password` into this record.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserPasswordNotSet`] for an empty password and
    /// [`AuthError::Hashing`] if the hasher itself fails.
    pub fn set_password(&mut self, password: &str) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::UserPasswordNotSet);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::hashing(e.to_string()))?;

        self.password_hash = Some(hash.to_string());

        Ok(())
    }

    /// Verifies `password` against the stored hash.
    ///
    /// Returns `false` both when the hash is absent and when the password
    /// is wrong; the two cases are indistinguishable to the caller.
    #[must_use]
    pub fn validate_password(&self, password: &str) -> bool {
        let Some(stored) = &self.password_hash else {
            return false;
        };

        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Returns `true` if a password hash is present.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Generates a fresh opaque password-reset code.
    pub fn generate_password_reset_hash(&mut self) {
        self.password_reset_hash = Some(Uuid::new_v4().to_string());
    }

    /// Returns `true` if the pending reset code (if any) has aged out of
    /// the [`PASSWORD_RESET_WINDOW`].
    #[must_use]
    pub fn password_reset_expired(&self) -> bool {
        match self.password_reset_at {
            Some(issued) => OffsetDateTime::now_utc() - issued > PASSWORD_RESET_WINDOW,
            None => true,
        }
    }
}

/// Filtering and paging parameters for directory listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQueryParams {
    /// Page number, starting at 1; 0 means unpaged.
    #[serde(default)]
    pub page: u32,

    /// Page size; 0 means unpaged.
    #[serde(default)]
    pub per_page: u32,

    /// Restrict to accounts with this role.
    #[serde(default)]
    pub role: Option<String>,

    /// Restrict to accounts with this status.
    #[serde(default)]
    pub status: Option<i32>,

    /// Case-insensitive substring match on email and names.
    #[serde(default)]
    pub query: Option<String>,
}
