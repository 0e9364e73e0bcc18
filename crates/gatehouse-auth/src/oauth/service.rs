//! Grant service.
//!
//! A constrained OAuth-style token endpoint with exactly two grant types:
//! `password` and `refresh_token`. Grant-type dispatch happens before any
//! client or credential work, so malformed grant types never leak whether
//! a client id is valid.
//!
//! # Refresh token lifecycle
//!
//! Per `(client, user)` pair: absent → live → expired → replaced.
//!
//! - The first successful password grant creates a refresh token.
//! - Later password grants reuse the live token as-is.
//! - An expired token is deleted lazily on the next password grant and a
//!   fresh one is created in its place.
//! - The refresh-token grant never rotates: it returns the same refresh
//!   token with a new access token, and fails closed once the refresh
//!   token itself has expired; the caller must re-authenticate.
//!
//! # Failure semantics
//!
//! Credential-resolution failures fold into deliberately vague errors
//! (invalid-client-or-secret, invalid-username-or-password) to resist
//! enumeration. Storage and signing failures propagate as opaque server
//! errors. The last-login stamp is best-effort and never fails a grant.

use std::sync::Arc;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::AuthStorage;
use crate::types::client::Client;
use crate::types::token::{AuthRequest, GrantType, Token, TokenResponse};
use crate::types::user::User;

/// Token type reported in every successful response.
const TOKEN_TYPE_BEARER: &str = "Bearer";

/// The token-endpoint grant service.
#[derive(Clone)]
pub struct AuthService {
    storage: Arc<dyn AuthStorage>,
    config: AuthConfig,
}

impl core::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates a new grant service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the configuration fails
    /// validation (missing signing key, zero lifetimes). The service
    /// refuses to exist half-configured.
    pub fn new(storage: Arc<dyn AuthStorage>, config: AuthConfig) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        Ok(Self { storage, config })
    }

    /// Processes a grant request end to end.
    ///
    /// Dispatches on `grant_type` via exact-string lookup, authenticates
    /// the client, then runs the selected grant handler.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidGrantType`] for an unrecognized grant
    /// type, before any client or credential work, and otherwise whatever
    /// the client check or grant handler returns.
    pub async fn token(&self, request: &AuthRequest) -> AuthResult<TokenResponse> {
        let Some(grant_type) = GrantType::parse(&request.grant_type) else {
            return Err(AuthError::InvalidGrantType);
        };

        let client = self.get_client(request).await?;

        match grant_type {
            GrantType::Password => self.password_grant(request, &client).await,
            GrantType::RefreshToken => self.refresh_token_grant(request, &client).await,
        }
    }

    /// Resolves and authenticates the client named in the request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyClientOrSecret`] when either credential is
    /// missing. An unknown client id and a wrong secret both return the
    /// single undifferentiated [`AuthError::InvalidClientOrSecret`], so the
    /// endpoint cannot be used to enumerate client ids.
    pub async fn get_client(&self, request: &AuthRequest) -> AuthResult<Client> {
        let client_id = request.client_id.as_deref().unwrap_or_default();
        let client_secret = request.client_secret.as_deref().unwrap_or_default();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(AuthError::EmptyClientOrSecret);
        }

        let client = match self.storage.find_client_by_client_id(client_id).await {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(error = %err, "error getting client ID");

                return Err(AuthError::InvalidClientOrSecret);
            }
        };

        if !client.validate_secret(client_secret) {
            tracing::error!("client secret is invalid");

            return Err(AuthError::InvalidClientOrSecret);
        }

        Ok(client)
    }

    /// Password grant: authenticate with username and password.
    ///
    /// On success, mints an access token, obtains or creates the refresh
    /// token for this `(client, user)` pair, stamps `last_login`
    /// best-effort, and returns the combined response.
    ///
    /// # Errors
    ///
    /// An unknown username and a wrong password both return
    /// [`AuthError::InvalidUsernameOrPassword`]. An account with no
    /// password hash returns the distinct
    /// [`AuthError::UserPasswordNotSet`]: that is a provisioning defect,
    /// not a credential guess.
    pub async fn password_grant(
        &self,
        request: &AuthRequest,
        client: &Client,
    ) -> AuthResult<TokenResponse> {
        let username = request.username.as_deref().unwrap_or_default();
        let password = request.password.as_deref().unwrap_or_default();

        let user = match self.storage.find_user_by_username(username).await {
            Ok(user) => user,
            Err(AuthError::UserNotFound) => {
                return Err(AuthError::InvalidUsernameOrPassword);
            }
            Err(err) => {
                tracing::error!(error = %err, "find user details error");

                return Err(err);
            }
        };

        if !user.has_password() {
            tracing::error!(user_id = %user.id, "user password hash field is empty");

            return Err(AuthError::UserPasswordNotSet);
        }

        if !user.validate_password(password) {
            tracing::error!(user_id = %user.id, "user password is wrong");

            return Err(AuthError::InvalidUsernameOrPassword);
        }

        let access_token = self.new_access_token(client, &user)?;
        let refresh_token = self.get_or_create_refresh_token(client, &user).await?;

        if let Err(err) = self.storage.update_last_login(user.id).await {
            tracing::error!(user_id = %user.id, error = %err, "unable to set user's last login");
        }

        Ok(TokenResponse::new(
            &access_token,
            Some(&refresh_token),
            &user,
            self.config.access_token_lifetime,
            TOKEN_TYPE_BEARER,
        ))
    }

    /// Refresh-token grant: mint a new access token against an existing
    /// refresh token.
    ///
    /// The refresh token is returned unchanged; this grant never rotates.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshTokenEmpty`] for a missing token value,
    /// [`AuthError::RefreshTokenNotFound`] when no row matches within this
    /// client's scope, and [`AuthError::RefreshTokenExpired`] once the
    /// token has aged out and the caller must fall back to a password
    /// grant.
    pub async fn refresh_token_grant(
        &self,
        request: &AuthRequest,
        client: &Client,
    ) -> AuthResult<TokenResponse> {
        let value = request.refresh_token.as_deref().unwrap_or_default();

        if value.is_empty() {
            return Err(AuthError::RefreshTokenEmpty);
        }

        let refresh_token = self.get_valid_refresh_token(value, client).await?;

        let user = match self.storage.find_user_by_id(refresh_token.user_id).await {
            Ok(user) => user,
            Err(err) => {
                tracing::error!(error = %err, "user not found for refresh token");

                return Err(err);
            }
        };

        let access_token = self.new_access_token(client, &user)?;

        Ok(TokenResponse::new(
            &access_token,
            Some(&refresh_token),
            &user,
            self.config.access_token_lifetime,
            TOKEN_TYPE_BEARER,
        ))
    }

    /// Mints an access token, logging the (fatal) signing failure.
    fn new_access_token(&self, client: &Client, user: &User) -> AuthResult<Token> {
        Token::new_access_token(
            client,
            user,
            self.config.access_token_lifetime,
            self.config.signing_key.as_bytes(),
        )
        .inspect_err(|err| {
            tracing::error!(error = %err, "unable to create access token");
        })
    }

    /// Retrieves the live refresh token for `(client, user)`, lazily
    /// rotating an expired one.
    ///
    /// Not transactionally safe: two concurrent grants can both reach the
    /// create; the storage contract resolves that by returning the
    /// existing live row.
    async fn get_or_create_refresh_token(
        &self,
        client: &Client,
        user: &User,
    ) -> AuthResult<Token> {
        let refresh_token = match self
            .storage
            .find_refresh_token_by_client_and_user(client.id, user.id)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!(error = %err, "no usable refresh token, creating one");

                return self.generate_new_refresh_token(client, user).await;
            }
        };

        if refresh_token.is_expired() {
            tracing::info!(token_id = %refresh_token.id, "refresh token expired, deleting");

            if let Err(err) = self.storage.delete_token(refresh_token.id).await {
                tracing::error!(token_id = %refresh_token.id, error = %err, "unable to delete token");
            }

            return self.generate_new_refresh_token(client, user).await;
        }

        Ok(refresh_token)
    }

    /// Creates and persists a fresh refresh token.
    async fn generate_new_refresh_token(&self, client: &Client, user: &User) -> AuthResult<Token> {
        self.storage
            .create_token(Token::new_refresh_token(
                client,
                user,
                self.config.refresh_token_lifetime,
            ))
            .await
            .inspect_err(|err| {
                tracing::error!(error = %err, "unable to create refresh token");
            })
    }

    /// Fetches the refresh token with `value` for this client and checks
    /// its expiry.
    async fn get_valid_refresh_token(&self, value: &str, client: &Client) -> AuthResult<Token> {
        let refresh_token = match self
            .storage
            .find_refresh_token_by_client_and_value(client.id, value)
            .await
        {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(error = %err, "unable to find refresh token for client");

                return Err(AuthError::RefreshTokenNotFound);
            }
        };

        if refresh_token.is_expired() {
            tracing::error!(token_id = %refresh_token.id, "refresh token already expired");

            return Err(AuthError::RefreshTokenExpired);
        }

        Ok(refresh_token)
    }
}
