//! # gatehouse-auth
//!
//! Authentication and account directory module for the Gatehouse backend.
//!
//! This crate provides:
//! - An OAuth-style token endpoint with password and refresh-token grants
//! - Access token minting (signed claims) and refresh token lifecycle
//! - A cache-backed user directory with flush-based invalidation
//! - Collaborator traits for storage, caching, and notifications
//!
//! ## Overview
//!
//! A grant request enters the [`oauth::AuthService`], which validates the
//! client, dispatches to a grant handler, and issues or rotates tokens via
//! the [`storage::AuthStorage`] collaborator. Account state is owned by
//! the [`users::UserService`], which wraps every read in the cache-aside
//! pattern and announces mutations on the notification queue.
//!
//! The HTTP layer, persistent storage engines, and notification delivery
//! are external collaborators; this crate defines their contracts and the
//! state machines between them.
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes and signing configuration
//! - [`error`] - Error taxonomy for auth and directory operations
//! - [`types`] - Domain types: clients, users, tokens, requests/responses
//! - [`cache`] - Cache-aside layer with flush-based invalidation
//! - [`queue`] - Notification queue contract and topics
//! - [`storage`] - Repository collaborator traits
//! - [`users`] - Cache-backed user directory service
//! - [`oauth`] - Grant dispatch and token issuance

pub mod cache;
pub mod config;
pub mod error;
pub mod oauth;
pub mod queue;
pub mod storage;
pub mod types;
pub mod users;

pub use cache::{CacheError, CacheResult, CacheService, CacheStorage};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use oauth::AuthService;
pub use queue::{
    QueueService, QueueStorage, TOPIC_USER_PASSWORD_CHANGED, TOPIC_USER_PASSWORD_RESET,
    TOPIC_USER_PROFILE_UPDATED,
};
pub use storage::{AuthStorage, UserStorage};
pub use types::{
    AccessTokenClaims, AuthRequest, Client, GrantType, PASSWORD_RESET_WINDOW, Token, TokenResponse,
    User, UserQueryParams,
};
pub use users::UserService;

/// Type alias for authentication/directory results.
pub type AuthResult<T> = Result<T, AuthError>;
