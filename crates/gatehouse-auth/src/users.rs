//! User directory service.
//!
//! The single point of truth for account state, backed opportunistically
//! by the cache layer. Reads go cache-first with a repository fallback and
//! best-effort population; every mutation persists through the repository
//! and then flushes the whole cache (correctness over precision).
//!
//! Side effects (cache writes, cache flushes, queue notifications) are
//! fire-and-forget: failures are logged and swallowed, with one deliberate
//! exception. A failed `user-password-reset` enqueue fails the whole
//! reset, because a reset nobody is told about is indistinguishable from a
//! dead end for the user.

use std::fmt::Display;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::cache::CacheService;
use crate::error::AuthError;
use crate::queue::{
    QueueService, TOPIC_USER_PASSWORD_CHANGED, TOPIC_USER_PASSWORD_RESET,
    TOPIC_USER_PROFILE_UPDATED,
};
use crate::storage::UserStorage;
use crate::types::user::{User, UserQueryParams};

/// Builds the cache key for a user, by email or by id.
fn user_key(part: impl Display) -> String {
    format!("user_{part}")
}

/// Cache-backed account directory.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserStorage>,
    queue: QueueService,
    cache: CacheService,
}

impl UserService {
    /// Creates a new directory service.
    #[must_use]
    pub fn new(repo: Arc<dyn UserStorage>, queue: QueueService, cache: CacheService) -> Self {
        Self { repo, queue, cache }
    }

    /// Looks up a user by username (email), cache-first.
    ///
    /// On a cache miss the repository is consulted and the cache is
    /// populated best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no user matches.
    pub async fn get_by_username(&self, username: &str) -> AuthResult<User> {
        let key = user_key(username);

        match self.cache.get_by_key::<User>(&key).await {
            Ok(user) => {
                tracing::debug!(key = %key, "returned cached user");

                return Ok(user);
            }
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "cache miss, falling back to repository");
            }
        }

        let user = self.repo.find_by_username(username).await?;

        if let Err(err) = self.cache.create(&key, &user).await {
            tracing::warn!(key = %key, error = %err, "unable to populate user cache");
        }

        Ok(user)
    }

    /// Looks up a user by id, cache-first.
    ///
    /// A nil id short-circuits to [`AuthError::UserNotFound`] without
    /// touching the cache or the repository.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no user matches.
    pub async fn get_by_id(&self, id: Uuid) -> AuthResult<User> {
        if id.is_nil() {
            tracing::debug!("nil user id, skipping lookup");

            return Err(AuthError::UserNotFound);
        }

        let key = user_key(id);

        match self.cache.get_by_key::<User>(&key).await {
            Ok(user) => {
                tracing::debug!(key = %key, "returned cached user");

                return Ok(user);
            }
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "cache miss, falling back to repository");
            }
        }

        let user = self.repo.find_by_id(id).await?;

        if let Err(err) = self.cache.create(&key, &user).await {
            tracing::warn!(key = %key, error = %err, "unable to populate user cache");
        }

        Ok(user)
    }

    /// Lists users matching `params`. Repository pass-through, no cache.
    pub async fn get_all(&self, params: &UserQueryParams) -> AuthResult<Vec<User>> {
        self.repo.find_all(params).await
    }

    /// Counts users matching `params`. Repository pass-through, no cache.
    pub async fn count_all(&self, params: &UserQueryParams) -> AuthResult<usize> {
        self.repo.count_all(params).await
    }

    /// Creates a new account with the given password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserPasswordNotSet`] for an empty password, a
    /// hashing error, or the repository error.
    pub async fn create(&self, password: &str, mut user: User) -> AuthResult<User> {
        user.set_password(password)?;

        let created = self.repo.create(user).await;

        self.flush_cache().await;

        created
    }

    /// Persists changes to an account and announces the update.
    ///
    /// # Errors
    ///
    /// Returns the repository error; the notification and the cache flush
    /// are best-effort.
    pub async fn update(&self, user: User) -> AuthResult<User> {
        let user = self.repo.update(user).await?;

        if let Err(err) = self.queue.add_object(TOPIC_USER_PROFILE_UPDATED, &user).await {
            tracing::error!(
                topic = TOPIC_USER_PROFILE_UPDATED,
                error = %err,
                "unable to enqueue notification"
            );
        }

        self.flush_cache().await;

        Ok(user)
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when the user does not exist.
    pub async fn delete(&self, id: Uuid) -> AuthResult<()> {
        self.repo.delete(id).await?;

        self.flush_cache().await;

        Ok(())
    }

    /// Replaces an account's password and clears any pending reset code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] if the user does not exist; a
    /// hashing failure is fatal to the operation.
    pub async fn update_password(&self, id: Uuid, new_password: &str) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|_| AuthError::UserNotFound)?;

        user.set_password(new_password)?;

        // The pending reset code is single-use.
        user.password_reset_hash = None;

        let user = self.repo.update(user).await?;

        if let Err(err) = self
            .queue
            .add_object(TOPIC_USER_PASSWORD_CHANGED, &user)
            .await
        {
            tracing::error!(
                topic = TOPIC_USER_PASSWORD_CHANGED,
                error = %err,
                "unable to enqueue notification"
            );
        }

        self.flush_cache().await;

        Ok(user)
    }

    /// Changes an account's username (email).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] if the user does not exist, or
    /// the update error.
    pub async fn update_username(&self, id: Uuid, new_username: &str) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|_| AuthError::UserNotFound)?;

        user.email = new_username.to_string();

        self.update(user).await
    }

    /// Stamps the account's last login time and persists it.
    ///
    /// # Errors
    ///
    /// Returns the repository error.
    pub async fn update_login(&self, mut user: User) -> AuthResult<User> {
        user.last_login = Some(OffsetDateTime::now_utc());

        let user = self.repo.update(user).await?;

        self.flush_cache().await;

        Ok(user)
    }

    /// Starts a password reset for `username`.
    ///
    /// Generates a fresh reset code and timestamp, persists them, and
    /// announces the reset. Any lookup failure collapses to
    /// [`AuthError::UserNotFound`]; the boundary maps that to a generic
    /// outcome so the endpoint cannot be used to probe which emails are
    /// registered.
    ///
    /// # Errors
    ///
    /// Unlike every other notification in this service, a failed enqueue
    /// here fails the whole operation.
    pub async fn reset_password(&self, username: &str) -> AuthResult<User> {
        let mut user = match self.repo.find_by_username(username).await {
            Ok(user) => user,
            Err(err) => {
                tracing::debug!(username = %username, error = %err, "unable to find user for reset");

                return Err(AuthError::UserNotFound);
            }
        };

        user.generate_password_reset_hash();
        user.password_reset_at = Some(OffsetDateTime::now_utc());

        let user = self.repo.update(user).await?;

        if let Err(err) = self.queue.add_object(TOPIC_USER_PASSWORD_RESET, &user).await {
            tracing::error!(
                topic = TOPIC_USER_PASSWORD_RESET,
                error = %err,
                "unable to enqueue reset notification, failing the reset"
            );

            return Err(err);
        }

        self.flush_cache().await;

        Ok(user)
    }

    /// Looks up a user by a pending reset code.
    ///
    /// Goes straight to the repository: reset codes are single-use and
    /// rarely re-read, so they are not worth caching.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] when no user carries the code.
    pub async fn get_by_reset_hash(&self, hash: &str) -> AuthResult<User> {
        self.repo.find_by_reset_hash(hash).await
    }

    /// Flushes the entire cache, logging (not propagating) any failure.
    async fn flush_cache(&self) {
        if let Err(err) = self.cache.flush().await {
            tracing::error!(error = %err, "flushing cache failed");
        }
    }
}
