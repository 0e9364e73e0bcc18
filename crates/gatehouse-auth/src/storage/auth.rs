//! Auth repository trait.
//!
//! Persistence operations consumed by the grant service: client
//! registrations, the user lookups the grants need, and refresh token
//! rows. Access tokens never appear here; they are stateless.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::client::Client;
use crate::types::token::Token;
use crate::types::user::User;

/// Storage operations backing the grant service.
#[async_trait]
pub trait AuthStorage: Send + Sync {
    /// Finds a client registration by its public `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::ClientNotFound`] when no registration
    /// matches, or a storage error.
    async fn find_client_by_client_id(&self, client_id: &str) -> AuthResult<Client>;

    /// Finds a user by username (email).
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when no user matches, or
    /// a storage error.
    async fn find_user_by_username(&self, username: &str) -> AuthResult<User>;

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::UserNotFound`] when no user matches, or
    /// a storage error.
    async fn find_user_by_id(&self, id: Uuid) -> AuthResult<User>;

    /// Stamps the user's `last_login` with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the write fails.
    /// Callers treat this as best-effort.
    async fn update_last_login(&self, id: Uuid) -> AuthResult<()>;

    /// Finds the refresh token bound to `(client_id, user_id)`.
    ///
    /// Returns the row regardless of expiry; the caller owns the expiry
    /// check and the lazy rotation that follows.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::TokenNotFound`] when no row matches.
    async fn find_refresh_token_by_client_and_user(
        &self,
        client_id: Uuid,
        user_id: Uuid,
    ) -> AuthResult<Token>;

    /// Finds the refresh token with value `token` issued to `client_id`.
    ///
    /// Scoping the lookup by client prevents replaying a refresh token
    /// through a different client's credentials.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::TokenNotFound`] when no row matches.
    async fn find_refresh_token_by_client_and_value(
        &self,
        client_id: Uuid,
        token: &str,
    ) -> AuthResult<Token>;

    /// Persists a new refresh token and returns the stored row.
    ///
    /// Two concurrent password grants can race past the expiry check and
    /// both attempt creation for the same `(client_id, user_id)` pair.
    /// Implementations must resolve that race with insert-if-absent
    /// semantics: when a live row for the pair already exists, return the
    /// existing row instead of inserting a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn create_token(&self, token: Token) -> AuthResult<Token>;

    /// Deletes a token row by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::TokenNotFound`] when no row matches.
    async fn delete_token(&self, id: Uuid) -> AuthResult<()>;
}
