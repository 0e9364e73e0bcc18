//! End-to-end grant flow tests against the in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use gatehouse_auth::config::AuthConfig;
use gatehouse_auth::error::AuthError;
use gatehouse_auth::oauth::AuthService;
use gatehouse_auth::types::{AuthRequest, Client, Token, User};
use gatehouse_db_memory::InMemoryAuthStorage;

const SIGNING_KEY: &str = "integration-signing-key";

struct Backend {
    storage: Arc<InMemoryAuthStorage>,
    service: AuthService,
    client: Client,
    user: User,
}

async fn backend() -> Backend {
    let storage = Arc::new(InMemoryAuthStorage::new());

    let client = Client {
        id: Uuid::new_v4(),
        client_id: "K1".to_string(),
        client_secret: "S1".to_string(),
    };

    let mut user = User::new("a@b.com");
    user.set_password("correct").unwrap();
    user.is_active = true;

    storage.seed_client(client.clone()).await;
    storage.seed_user(user.clone()).await;

    let service = AuthService::new(
        storage.clone(),
        AuthConfig::new(SIGNING_KEY)
            .with_access_token_lifetime(Duration::from_secs(3600))
            .with_refresh_token_lifetime(Duration::from_secs(86400)),
    )
    .unwrap();

    Backend {
        storage,
        service,
        client,
        user,
    }
}

fn password_request(username: &str, password: &str) -> AuthRequest {
    AuthRequest {
        client_id: Some("K1".to_string()),
        client_secret: Some("S1".to_string()),
        grant_type: "password".to_string(),
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        refresh_token: None,
    }
}

fn refresh_request(token: &str) -> AuthRequest {
    AuthRequest {
        client_id: Some("K1".to_string()),
        client_secret: Some("S1".to_string()),
        grant_type: "refresh_token".to_string(),
        username: None,
        password: None,
        refresh_token: Some(token.to_string()),
    }
}

#[tokio::test]
async fn password_grant_returns_tokens_for_seeded_user() {
    let backend = backend().await;

    let response = backend
        .service
        .token(&password_request("a@b.com", "correct"))
        .await
        .unwrap();

    assert_eq!(response.user_id, backend.user.id);
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 3600);
    assert!(!response.access_token.is_empty());
    assert!(response.refresh_token.is_some());
    assert!(!response.refresh_token.as_deref().unwrap().is_empty());

    let claims =
        Token::decode_access_token(&response.access_token, SIGNING_KEY.as_bytes()).unwrap();
    assert_eq!(claims.uid, backend.user.id);
}

#[tokio::test]
async fn password_grant_wrong_password_is_generic() {
    let backend = backend().await;

    let wrong = backend
        .service
        .token(&password_request("a@b.com", "wrong"))
        .await
        .unwrap_err();

    let unknown = backend
        .service
        .token(&password_request("nobody@b.com", "correct"))
        .await
        .unwrap_err();

    assert_eq!(wrong, AuthError::InvalidUsernameOrPassword);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn unknown_grant_type_is_rejected_first() {
    let backend = backend().await;

    let request = AuthRequest {
        grant_type: "authorization_code".to_string(),
        ..password_request("a@b.com", "correct")
    };

    let err = backend.service.token(&request).await.unwrap_err();
    assert_eq!(err, AuthError::InvalidGrantType);
}

#[tokio::test]
async fn unknown_client_and_wrong_secret_are_indistinguishable() {
    let backend = backend().await;

    let unknown = AuthRequest {
        client_id: Some("NoSuchClient".to_string()),
        ..password_request("a@b.com", "correct")
    };

    let wrong = AuthRequest {
        client_secret: Some("S2".to_string()),
        ..password_request("a@b.com", "correct")
    };

    let err_unknown = backend.service.token(&unknown).await.unwrap_err();
    let err_wrong = backend.service.token(&wrong).await.unwrap_err();

    assert_eq!(err_unknown, AuthError::InvalidClientOrSecret);
    assert_eq!(err_unknown, err_wrong);
}

#[tokio::test]
async fn repeated_password_grants_reuse_live_refresh_token() {
    let backend = backend().await;
    let request = password_request("a@b.com", "correct");

    let first = backend.service.token(&request).await.unwrap();
    let second = backend.service.token(&request).await.unwrap();

    assert_eq!(first.refresh_token, second.refresh_token);
    assert_eq!(backend.storage.tokens().await.len(), 1);
}

#[tokio::test]
async fn expired_refresh_token_is_replaced_on_next_password_grant() {
    let backend = backend().await;

    let mut expired =
        Token::new_refresh_token(&backend.client, &backend.user, Duration::from_secs(600));
    expired.expires_at = time::OffsetDateTime::now_utc() - time::Duration::minutes(1);
    let expired_value = expired.token.clone();
    backend.storage.seed_token(expired).await;

    let response = backend
        .service
        .token(&password_request("a@b.com", "correct"))
        .await
        .unwrap();

    assert_ne!(response.refresh_token.as_deref(), Some(expired_value.as_str()));

    // The expired row was deleted during the lazy rotation.
    let tokens = backend.storage.tokens().await;
    assert_eq!(tokens.len(), 1);
    assert_ne!(tokens[0].token, expired_value);
}

#[tokio::test]
async fn refresh_grant_mints_access_token_without_rotation() {
    let backend = backend().await;

    let granted = backend
        .service
        .token(&password_request("a@b.com", "correct"))
        .await
        .unwrap();
    let refresh_value = granted.refresh_token.unwrap();

    let refreshed = backend
        .service
        .token(&refresh_request(&refresh_value))
        .await
        .unwrap();

    assert_eq!(refreshed.refresh_token.as_deref(), Some(refresh_value.as_str()));
    assert_eq!(refreshed.user_id, backend.user.id);

    let claims =
        Token::decode_access_token(&refreshed.access_token, SIGNING_KEY.as_bytes()).unwrap();
    assert_eq!(claims.uid, backend.user.id);
}

#[tokio::test]
async fn refresh_grant_failure_modes() {
    let backend = backend().await;

    let empty = backend.service.token(&refresh_request("")).await.unwrap_err();
    assert_eq!(empty, AuthError::RefreshTokenEmpty);

    let unknown = backend
        .service
        .token(&refresh_request("no-such-value"))
        .await
        .unwrap_err();
    assert_eq!(unknown, AuthError::RefreshTokenNotFound);

    let mut expired =
        Token::new_refresh_token(&backend.client, &backend.user, Duration::from_secs(600));
    expired.expires_at = time::OffsetDateTime::now_utc() - time::Duration::minutes(1);
    let value = expired.token.clone();
    backend.storage.seed_token(expired).await;

    let err = backend.service.token(&refresh_request(&value)).await.unwrap_err();
    assert_eq!(err, AuthError::RefreshTokenExpired);
}

#[tokio::test]
async fn refresh_grant_ignores_other_clients_tokens() {
    let backend = backend().await;

    let other_client = Client {
        id: Uuid::new_v4(),
        client_id: "K2".to_string(),
        client_secret: "S2".to_string(),
    };
    backend.storage.seed_client(other_client.clone()).await;

    let granted = backend
        .service
        .token(&password_request("a@b.com", "correct"))
        .await
        .unwrap();
    let refresh_value = granted.refresh_token.unwrap();

    // Replaying K1's refresh token through K2's credentials must fail.
    let request = AuthRequest {
        client_id: Some("K2".to_string()),
        client_secret: Some("S2".to_string()),
        ..refresh_request(&refresh_value)
    };

    let err = backend.service.token(&request).await.unwrap_err();
    assert_eq!(err, AuthError::RefreshTokenNotFound);
}

#[tokio::test]
async fn user_without_password_hash_is_a_provisioning_error() {
    let backend = backend().await;

    let bare = User::new("bare@b.com");
    backend.storage.seed_user(bare).await;

    let err = backend
        .service
        .token(&password_request("bare@b.com", "anything"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::UserPasswordNotSet);
}

#[tokio::test]
async fn concurrent_password_grants_converge_on_one_refresh_token() {
    let backend = backend().await;
    let request = password_request("a@b.com", "correct");

    let (a, b) = tokio::join!(
        backend.service.token(&request),
        backend.service.token(&request)
    );

    let a = a.unwrap();
    let b = b.unwrap();

    // Whichever order the two grants landed in, the storage upsert
    // guarantees a single live row and both responses reference it.
    assert_eq!(a.refresh_token, b.refresh_token);
    assert_eq!(backend.storage.tokens().await.len(), 1);
}
