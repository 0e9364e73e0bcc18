//! In-memory auth repository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use gatehouse_auth::error::AuthError;
use gatehouse_auth::storage::AuthStorage;
use gatehouse_auth::types::{Client, Token, User};
use gatehouse_auth::AuthResult;

/// In-memory implementation of [`AuthStorage`].
///
/// Clients, users, and token rows live behind `RwLock`s; `create_token`
/// implements the insert-if-absent contract so racing password grants for
/// the same `(client, user)` pair converge on one live row.
#[derive(Default)]
pub struct InMemoryAuthStorage {
    clients: RwLock<Vec<Client>>,
    users: RwLock<Vec<User>>,
    tokens: RwLock<Vec<Token>>,
}

impl InMemoryAuthStorage {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client registration.
    pub async fn seed_client(&self, client: Client) {
        self.clients.write().await.push(client);
    }

    /// Adds a user account.
    pub async fn seed_user(&self, user: User) {
        self.users.write().await.push(user);
    }

    /// Adds a token row as-is, bypassing the upsert logic.
    pub async fn seed_token(&self, token: Token) {
        self.tokens.write().await.push(token);
    }

    /// Returns a snapshot of the stored token rows.
    pub async fn tokens(&self) -> Vec<Token> {
        self.tokens.read().await.clone()
    }
}

#[async_trait]
impl AuthStorage for InMemoryAuthStorage {
    async fn find_client_by_client_id(&self, client_id: &str) -> AuthResult<Client> {
        self.clients
            .read()
            .await
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned()
            .ok_or(AuthError::ClientNotFound)
    }

    async fn find_user_by_username(&self, username: &str) -> AuthResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.email == username)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AuthResult<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn update_last_login(&self, id: Uuid) -> AuthResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AuthError::UserNotFound)?;

        user.last_login = Some(time::OffsetDateTime::now_utc());

        Ok(())
    }

    async fn find_refresh_token_by_client_and_user(
        &self,
        client_id: Uuid,
        user_id: Uuid,
    ) -> AuthResult<Token> {
        self.tokens
            .read()
            .await
            .iter()
            .find(|t| t.client_id == client_id && t.user_id == user_id)
            .cloned()
            .ok_or(AuthError::TokenNotFound)
    }

    async fn find_refresh_token_by_client_and_value(
        &self,
        client_id: Uuid,
        token: &str,
    ) -> AuthResult<Token> {
        self.tokens
            .read()
            .await
            .iter()
            .find(|t| t.client_id == client_id && t.token == token)
            .cloned()
            .ok_or(AuthError::TokenNotFound)
    }

    async fn create_token(&self, token: Token) -> AuthResult<Token> {
        let mut tokens = self.tokens.write().await;

        // Insert-if-absent: when a live row already exists for this
        // (client, user) pair, hand it back instead of duplicating.
        if let Some(existing) = tokens
            .iter()
            .find(|t| t.client_id == token.client_id && t.user_id == token.user_id)
            .filter(|t| !t.is_expired())
        {
            return Ok(existing.clone());
        }

        tokens.push(token.clone());

        Ok(token)
    }

    async fn delete_token(&self, id: Uuid) -> AuthResult<()> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();

        tokens.retain(|t| t.id != id);

        if tokens.len() == before {
            return Err(AuthError::TokenNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> Client {
        Client {
            id: Uuid::new_v4(),
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_client_by_client_id() {
        let storage = InMemoryAuthStorage::new();
        let seeded = client();
        storage.seed_client(seeded.clone()).await;

        let found = storage.find_client_by_client_id("test-client").await.unwrap();
        assert_eq!(found.id, seeded.id);

        let err = storage.find_client_by_client_id("absent").await.unwrap_err();
        assert_eq!(err, AuthError::ClientNotFound);
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let storage = InMemoryAuthStorage::new();
        let user = User::new("peter@test.com");
        storage.seed_user(user.clone()).await;

        let by_name = storage.find_user_by_username("peter@test.com").await.unwrap();
        assert_eq!(by_name.id, user.id);

        let by_id = storage.find_user_by_id(user.id).await.unwrap();
        assert_eq!(by_id.email, "peter@test.com");

        let err = storage.find_user_by_id(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, AuthError::UserNotFound);
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let storage = InMemoryAuthStorage::new();
        let user = User::new("peter@test.com");
        storage.seed_user(user.clone()).await;

        storage.update_last_login(user.id).await.unwrap();

        let stored = storage.find_user_by_id(user.id).await.unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_create_token_returns_existing_live_row() {
        let storage = InMemoryAuthStorage::new();
        let c = client();
        let user = User::new("peter@test.com");

        let first = Token::new_refresh_token(&c, &user, Duration::from_secs(600));
        let second = Token::new_refresh_token(&c, &user, Duration::from_secs(600));

        let stored_first = storage.create_token(first.clone()).await.unwrap();
        let stored_second = storage.create_token(second).await.unwrap();

        // The duplicate insert resolved to the existing live row.
        assert_eq!(stored_first.token, stored_second.token);
        assert_eq!(stored_first.token, first.token);
        assert_eq!(storage.tokens().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_token_replaces_nothing_when_existing_expired() {
        let storage = InMemoryAuthStorage::new();
        let c = client();
        let user = User::new("peter@test.com");

        let mut expired = Token::new_refresh_token(&c, &user, Duration::from_secs(600));
        expired.expires_at = time::OffsetDateTime::now_utc() - time::Duration::minutes(1);
        storage.seed_token(expired).await;

        let fresh = Token::new_refresh_token(&c, &user, Duration::from_secs(600));
        let stored = storage.create_token(fresh.clone()).await.unwrap();

        // An expired row does not satisfy the insert-if-absent check.
        assert_eq!(stored.token, fresh.token);
        assert_eq!(storage.tokens().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_token() {
        let storage = InMemoryAuthStorage::new();
        let c = client();
        let user = User::new("peter@test.com");

        let token = Token::new_refresh_token(&c, &user, Duration::from_secs(600));
        let id = token.id;
        storage.seed_token(token).await;

        storage.delete_token(id).await.unwrap();
        assert!(storage.tokens().await.is_empty());

        let err = storage.delete_token(id).await.unwrap_err();
        assert_eq!(err, AuthError::TokenNotFound);
    }

    #[tokio::test]
    async fn test_token_lookup_scoped_by_client() {
        let storage = InMemoryAuthStorage::new();
        let c1 = client();
        let c2 = client();
        let user = User::new("peter@test.com");

        let token = Token::new_refresh_token(&c1, &user, Duration::from_secs(600));
        let value = token.token.clone();
        storage.seed_token(token).await;

        assert!(
            storage
                .find_refresh_token_by_client_and_value(c1.id, &value)
                .await
                .is_ok()
        );
        assert_eq!(
            storage
                .find_refresh_token_by_client_and_value(c2.id, &value)
                .await
                .unwrap_err(),
            AuthError::TokenNotFound
        );
    }
}
