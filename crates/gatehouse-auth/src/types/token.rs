//! Token value types and construction rules.
//!
//! Access and refresh tokens share one record shape. An access token's
//! value is a signed claims blob and is never persisted; a refresh token's
//! value is an opaque random string and is persisted, looked up by
//! `(client_id, value)` or `(client_id, user_id)`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::client::Client;
use crate::types::user::User;

/// Supported OAuth-style grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Resource owner password credentials.
    Password,
    /// Refresh an access token without re-entering a password.
    RefreshToken,
}

impl GrantType {
    /// Returns the `grant_type` parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Exact-string lookup used by the grant dispatch table.
    ///
    /// Returns `None` for anything outside the two supported grants; the
    /// caller rejects before doing any client or credential work.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "password" => Some(Self::Password),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Grant request parameters.
///
/// One structure serves both grant types; which fields must be present
/// depends on `grant_type`:
///
/// - `password`: username, password
/// - `refresh_token`: refresh_token
///
/// Client credentials are required for every grant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthRequest {
    /// Public client identifier.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Requested grant type. One of: "password", "refresh_token".
    #[serde(default)]
    pub grant_type: String,

    /// Username (password grant).
    #[serde(default)]
    pub username: Option<String>,

    /// Password (password grant).
    #[serde(default)]
    pub password: Option<String>,

    /// Refresh token value (refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Signed claims carried by an access token.
///
/// Claim names are part of the wire format consumed by existing clients:
/// `uid` for the subject and `auth` for the role claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject user id.
    pub uid: Uuid,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Role of the subject at issue time.
    pub auth: String,
}

/// An access or refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Unique identifier for this token record.
    pub id: Uuid,

    /// Registration id of the client this token is bound to.
    pub client_id: Uuid,

    /// Id of the user this token was issued for.
    pub user_id: Uuid,

    /// The token value: a signed claims blob for access tokens, an opaque
    /// random string for refresh tokens.
    pub token: String,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Mints a signed access token for `user`, bound to `client`.
    ///
    /// The claims payload carries the subject id, issue and expiry times,
    /// and the user's role. The result is stateless and never persisted.
    ///
    /// # Errors
    ///
    /// Signing is the only failure mode and is fatal to the grant.
    pub fn new_access_token(
        client: &Client,
        user: &User,
        lifetime: std::time::Duration,
        signing_key: &[u8],
    ) -> AuthResult<Self> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + lifetime;

        let claims = AccessTokenClaims {
            uid: user.id,
            exp: expires_at.unix_timestamp(),
            iat: now.unix_timestamp(),
            auth: user.role.clone(),
        };

        let signed = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(signing_key),
        )
        .map_err(|e| AuthError::signing(e.to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            client_id: client.id,
            user_id: user.id,
            token: signed,
            expires_at,
        })
    }

    /// Creates a refresh token with a fresh opaque random value.
    ///
    /// Never fails; the value is 256 bits of OS randomness, base64url
    /// encoded.
    #[must_use]
    pub fn new_refresh_token(client: &Client, user: &User, lifetime: std::time::Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: client.id,
            user_id: user.id,
            token: Self::generate_value(),
            expires_at: OffsetDateTime::now_utc() + lifetime,
        }
    }

    /// Generates a cryptographically secure opaque token value.
    #[must_use]
    pub fn generate_value() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if this token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Decodes and verifies a signed access-token value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the signature or claims fail
    /// verification (including expiry).
    pub fn decode_access_token(value: &str, signing_key: &[u8]) -> AuthResult<AccessTokenClaims> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<AccessTokenClaims>(value, &DecodingKey::from_secret(signing_key), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::signing(e.to_string()))
    }
}

/// The externally visible payload of a successful grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Id of the user the tokens were issued for.
    pub user_id: Uuid,

    /// The signed access token value.
    pub access_token: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Token type, always "Bearer" in practice.
    pub token_type: String,

    /// Refresh token value; omitted when no refresh token was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope; unused by the current grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Role of the user at issue time.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authority: String,
}

impl TokenResponse {
    /// Assembles a response from minted tokens.
    ///
    /// The refresh token field is omitted entirely when `refresh_token` is
    /// `None`.
    #[must_use]
    pub fn new(
        access_token: &Token,
        refresh_token: Option<&Token>,
        user: &User,
        lifetime: std::time::Duration,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            user_id: access_token.user_id,
            access_token: access_token.token.clone(),
            expires_in: lifetime.as_secs(),
            token_type: token_type.into(),
            refresh_token: refresh_token.map(|t| t.token.clone()),
            scope: None,
            authority: user.role.clone(),
        }
    }
}
