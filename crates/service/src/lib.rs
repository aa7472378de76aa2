//! Service layer holding the authentication core.
//! - Framework-independent: no HTTP types cross this boundary.
//! - Persistence goes through the `AccountStore` trait, with an in-memory
//!   implementation for tests and a SeaORM one over `models::account`.

pub mod auth;
#[cfg(test)]
pub mod test_support;
