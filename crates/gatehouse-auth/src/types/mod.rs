//! Domain types for authentication and the account directory.

pub mod client;
pub mod token;
pub mod user;

pub use client::Client;
pub use token::{AccessTokenClaims, AuthRequest, GrantType, Token, TokenResponse};
pub use user::{PASSWORD_RESET_WINDOW, User, UserQueryParams, role, status};
