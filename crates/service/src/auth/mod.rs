//! Auth module: domain, token, repository and service layers.
//!
//! Session tokens are fenced per account: only the token whose `iat` equals
//! the account's stored `token_epoch` is accepted, so issuing a new token
//! retires every earlier one.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod password;
pub mod repository;
pub mod repo;
pub mod service;
pub mod token;

pub use errors::AuthError;
pub use service::{AuthConfig, AuthService};
