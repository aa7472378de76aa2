//! Signed session tokens: issuance, parsing and the session-fence check.
//!
//! Tokens are compact HS256 JWTs carrying `sub` (email), `iat` and `exp`
//! (seconds) plus optional extra claims. A token is only accepted for an
//! account while its `iat` equals the account's persisted `token_epoch`.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::clock::Clock;
use super::domain::{Account, SessionToken};
use super::errors::AuthError;

pub use configs::{MAX_JWT_EXPIRATION_MS, MIN_JWT_KEY_BYTES};

const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Process-wide HMAC key, used for both signing and verification.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Decode a base64 secret. Anything unusable is a startup fault.
    pub fn from_base64(secret: &str) -> Result<Self, AuthError> {
        let bytes = general_purpose::STANDARD
            .decode(secret.trim())
            .map_err(|e| AuthError::SigningKeyMisconfigured(format!("secret is not valid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuthError> {
        if bytes.len() < MIN_JWT_KEY_BYTES {
            return Err(AuthError::SigningKeyMisconfigured(format!(
                "key is {} bytes, HS256 needs at least {}",
                bytes.len(),
                MIN_JWT_KEY_BYTES
            )));
        }
        Ok(Self { encoding: EncodingKey::from_secret(bytes), decoding: DecodingKey::from_secret(bytes) })
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Creates signed tokens. Pure apart from reading the clock; persisting
/// `issued_at` is the caller's job.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Arc<SigningKey>,
    expiration_ms: u64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(key: Arc<SigningKey>, expiration_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self { key, expiration_ms, clock }
    }

    pub fn issue(&self, email: &str, mut extra_claims: Map<String, Value>) -> Result<SessionToken, AuthError> {
        for reserved in RESERVED_CLAIMS {
            extra_claims.remove(reserved);
        }
        let now_ms = self.clock.now_millis();
        let issued_at = now_ms.div_euclid(1000);
        let expires_at = i64::try_from(self.expiration_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .and_then(|ms| now_ms.checked_add(ms))
            .ok_or_else(|| {
                AuthError::SigningKeyMisconfigured(format!("token expiration {}ms is out of range", self.expiration_ms))
            })?
            .div_euclid(1000);
        let claims = Claims { sub: email.to_string(), iat: issued_at, exp: expires_at, extra: extra_claims };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key.encoding)
            .map_err(|e| AuthError::SigningKeyMisconfigured(e.to_string()))?;

        Ok(SessionToken {
            token,
            email: claims.sub,
            issued_at,
            expires_at,
            expiration_ms: self.expiration_ms,
            extra_claims: claims.extra,
        })
    }
}

/// Verifies signature, expiry, subject and session fence. Holds no mutable
/// state, so one instance can be shared across all requests.
#[derive(Clone)]
pub struct TokenValidator {
    key: Arc<SigningKey>,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(key: Arc<SigningKey>, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against our own clock, with zero leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        // no audience is defined; an `aud` passed as an extra claim is carried, not checked
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { key, clock, validation }
    }

    pub fn parse_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::TokenSignatureInvalid,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenMalformed,
        })?;
        let claims = data.claims;
        if claims.exp < self.clock.now_secs() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    pub fn extract_email(&self, token: &str) -> Result<String, AuthError> {
        self.parse_claims(token).map(|c| c.sub)
    }

    pub fn extract_issued_at(&self, token: &str) -> Result<i64, AuthError> {
        self.parse_claims(token).map(|c| c.iat)
    }

    pub fn extract_expiration(&self, token: &str) -> Result<i64, AuthError> {
        self.parse_claims(token).map(|c| c.exp)
    }

    /// Full check against `account`: parse errors pass through, a subject or
    /// fence mismatch is `TokenInvalid`. An account with no epoch never validates.
    pub fn validate(&self, token: &str, account: &Account) -> Result<Claims, AuthError> {
        let claims = self.parse_claims(token)?;
        if claims.sub != account.email {
            debug!(email = %account.email, "token subject mismatch");
            return Err(AuthError::TokenInvalid);
        }
        match account.token_epoch {
            Some(epoch) if epoch == claims.iat => Ok(claims),
            Some(epoch) => {
                debug!(email = %account.email, epoch, iat = claims.iat, "token superseded by a later issuance");
                Err(AuthError::TokenInvalid)
            }
            None => {
                debug!(email = %account.email, "account has no token epoch");
                Err(AuthError::TokenInvalid)
            }
        }
    }

    pub fn is_valid(&self, token: &str, account: &Account) -> bool {
        self.validate(token, account).is_ok()
    }
}
