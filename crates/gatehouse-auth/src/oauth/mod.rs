//! OAuth-style grant processing.

pub mod service;

pub use service::AuthService;
