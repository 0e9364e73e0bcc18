//! In-memory user repository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use gatehouse_auth::error::AuthError;
use gatehouse_auth::storage::UserStorage;
use gatehouse_auth::types::{User, UserQueryParams};
use gatehouse_auth::AuthResult;

/// In-memory implementation of [`UserStorage`].
#[derive(Default)]
pub struct InMemoryUserStorage {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStorage {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user account.
    pub async fn seed_user(&self, user: User) {
        self.users.write().await.push(user);
    }

    fn matches(user: &User, params: &UserQueryParams) -> bool {
        if let Some(role) = &params.role {
            if &user.role != role {
                return false;
            }
        }

        if let Some(status) = params.status {
            if user.status != status {
                return false;
            }
        }

        if let Some(query) = &params.query {
            let needle = query.to_lowercase();
            let haystack = format!(
                "{} {} {}",
                user.email.to_lowercase(),
                user.first_name.to_lowercase(),
                user.last_name.to_lowercase()
            );

            if !haystack.contains(&needle) {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_username(&self, username: &str) -> AuthResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == username)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_by_reset_hash(&self, hash: &str) -> AuthResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.password_reset_hash.as_deref() == Some(hash))
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_all(&self, params: &UserQueryParams) -> AuthResult<Vec<User>> {
        let users = self.users.read().await;

        let mut matched: Vec<User> = users
            .iter()
            .filter(|u| Self::matches(u, params))
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.email.cmp(&b.email));

        if params.page > 0 && params.per_page > 0 {
            let start = ((params.page - 1) * params.per_page) as usize;
            matched = matched
                .into_iter()
                .skip(start)
                .take(params.per_page as usize)
                .collect();
        }

        Ok(matched)
    }

    async fn count_all(&self, params: &UserQueryParams) -> AuthResult<usize> {
        let users = self.users.read().await;

        Ok(users.iter().filter(|u| Self::matches(u, params)).count())
    }

    async fn create(&self, user: User) -> AuthResult<User> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::storage("username taken"));
        }

        users.push(user.clone());

        Ok(user)
    }

    async fn update(&self, user: User) -> AuthResult<User> {
        let mut users = self.users.write().await;

        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AuthError::UserNotFound)?;

        *slot = user.clone();

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let before = users.len();

        users.retain(|u| u.id != id);

        if users.len() == before {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
