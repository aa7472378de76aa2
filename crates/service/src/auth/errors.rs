use thiserror::Error;

/// Closed set of outcomes the authentication core can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User is not active")]
    AccountNotActive,
    #[error("User with email {0} already exists")]
    AccountAlreadyExists(String),
    #[error("{0}")]
    InputMismatch(String),
    #[error("Account not found")]
    AccountNotFound,
    #[error("Malformed token")]
    TokenMalformed,
    #[error("Invalid token signature")]
    TokenSignatureInvalid,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token is expired or invalid")]
    TokenInvalid,
    #[error("signing key misconfigured: {0}")]
    SigningKeyMisconfigured(String),
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 1001,
            AuthError::AccountNotActive => 1002,
            AuthError::AccountAlreadyExists(_) => 1003,
            AuthError::InputMismatch(_) => 1004,
            AuthError::AccountNotFound => 1005,
            AuthError::TokenMalformed => 1101,
            AuthError::TokenSignatureInvalid => 1102,
            AuthError::TokenExpired => 1103,
            AuthError::TokenInvalid => 1104,
            AuthError::SigningKeyMisconfigured(_) => 1900,
            AuthError::Hashing(_) => 1901,
            AuthError::Repository(_) => 1200,
        }
    }

    /// Token parsing failures are reported to clients as a single `TokenInvalid`.
    pub fn public(self) -> AuthError {
        match self {
            AuthError::TokenMalformed | AuthError::TokenSignatureInvalid | AuthError::TokenExpired => {
                AuthError::TokenInvalid
            }
            other => other,
        }
    }

    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::TokenMalformed
                | AuthError::TokenSignatureInvalid
                | AuthError::TokenExpired
                | AuthError::TokenInvalid
        )
    }
}
