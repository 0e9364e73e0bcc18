//! User repository trait.
//!
//! Persistence operations consumed by the directory service. The service
//! owns caching and side-effect notifications; implementations only need
//! to be the source of truth.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::user::{User, UserQueryParams};

/// Storage operations backing the user directory.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by username (email).
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when no user matches, or
    /// a storage error.
    async fn find_by_username(&self, username: &str) -> AuthResult<User>;

    /// Finds a user by a pending password-reset code.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when no user carries the
    /// code.
    async fn find_by_reset_hash(&self, hash: &str) -> AuthResult<User>;

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when no user matches.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<User>;

    /// Lists users matching `params`, paged.
    async fn find_all(&self, params: &UserQueryParams) -> AuthResult<Vec<User>>;

    /// Counts users matching `params` (ignoring paging).
    async fn count_all(&self, params: &UserQueryParams) -> AuthResult<usize>;

    /// Persists a new user and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken or the write fails.
    async fn create(&self, user: User) -> AuthResult<User>;

    /// Persists changes to an existing user and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when the user does not
    /// exist.
    async fn update(&self, user: User) -> AuthResult<User>;

    /// Deletes a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when the user does not
    /// exist.
    async fn delete(&self, id: Uuid) -> AuthResult<()>;
}
