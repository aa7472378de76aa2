use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use super::domain::{
    Account, AccountDetail, AccountSummary, AuthSession, CurrentPrincipal, LoginInput, RegisterInput,
};
use super::errors::AuthError;
use super::password::PasswordHasher;
use super::repository::AccountStore;
use super::token::{SigningKey, TokenIssuer, TokenValidator, MAX_JWT_EXPIRATION_MS};

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Base64-encoded HMAC secret.
    pub jwt_secret: String,
    pub expiration_ms: u64,
}

impl From<&configs::JwtConfig> for AuthConfig {
    fn from(cfg: &configs::JwtConfig) -> Self {
        Self { jwt_secret: cfg.secret_key.clone(), expiration_ms: cfg.expiration_ms }
    }
}

/// Login, registration, verification, refresh and bearer resolution over one
/// account store.
///
/// None of the load-mutate-save sequences here are serialized per account.
/// Two concurrent logins or refreshes both succeed; whichever save lands last
/// owns `token_epoch`, and the other caller's token is already dead.
pub struct AuthService<S: AccountStore + ?Sized> {
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl<S: AccountStore + ?Sized> AuthService<S> {
    /// Fails with `SigningKeyMisconfigured` when the secret is unusable.
    pub fn new(store: Arc<S>, hasher: Arc<dyn PasswordHasher>, cfg: AuthConfig) -> Result<Self, AuthError> {
        Self::with_clock(store, hasher, cfg, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        hasher: Arc<dyn PasswordHasher>,
        cfg: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        if cfg.expiration_ms == 0 || cfg.expiration_ms > MAX_JWT_EXPIRATION_MS {
            return Err(AuthError::SigningKeyMisconfigured(format!(
                "token expiration must be within 1..={MAX_JWT_EXPIRATION_MS}ms, got {}",
                cfg.expiration_ms
            )));
        }
        let key = Arc::new(SigningKey::from_base64(&cfg.jwt_secret)?);
        Ok(Self {
            store,
            hasher,
            issuer: TokenIssuer::new(key.clone(), cfg.expiration_ms, clock.clone()),
            validator: TokenValidator::new(key, clock),
        })
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Authenticate with email and password and start a new session.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::InMemoryAccountStore};
    /// use service::auth::password::Argon2Hasher;
    /// use service::auth::domain::{LoginInput, RegisterInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(InMemoryAccountStore::default());
    /// let cfg = AuthConfig { jwt_secret: "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=".into(), expiration_ms: 60_000 };
    /// let svc = AuthService::new(repo, Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()), cfg).unwrap();
    /// let created = tokio_test::block_on(svc.register(RegisterInput {
    ///     first_name: "Ada".into(), last_name: "Lovelace".into(), email: "ada@example.com".into(),
    ///     password: "Passw0rd!".into(), password_confirmation: "Passw0rd!".into(),
    /// })).unwrap();
    /// tokio_test::block_on(svc.verify(created.token.as_deref().unwrap())).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "ada@example.com".into(), password: "Passw0rd!".into() })).unwrap();
    /// assert_eq!(session.email, "ada@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let found = self.store.find_by_email(&input.email).await?;
        let mut account = match found {
            Some(a) if self.hasher.verify(&input.password, &a.password_hash) => a,
            // unknown email and wrong password look the same to the caller
            _ => {
                info!("login_rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !account.is_active() {
            info!(status = %account.status, "login_rejected");
            return Err(AuthError::AccountNotActive);
        }

        let token = self.issuer.issue(&account.email, Map::new())?;
        account.fence(&token);
        let account = self.store.save(account).await?;
        info!(iat = token.issued_at, "account_logged_in");
        Ok(AuthSession::for_account(&account, token))
    }

    /// Create a pending account and hand back its verification token.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AccountSummary, AuthError> {
        if input.password != input.password_confirmation {
            return Err(AuthError::InputMismatch("Password and password confirmation do not match".into()));
        }
        if let Some(existing) = self.store.find_by_email(&input.email).await? {
            debug!("account exists: {}", existing.email);
            return Err(AuthError::AccountAlreadyExists(existing.email));
        }

        let hash = self.hasher.hash(&input.password)?;
        let mut account = Account::new_pending(&input.first_name, &input.last_name, &input.email, hash);
        let token = self.issuer.issue(&account.email, Map::new())?;
        account.pending_verification_token = Some(token.token.clone());
        account.fence(&token);

        let account = self.store.save(account).await?;
        info!(account_id = ?account.id, "account_registered");
        Ok(AccountSummary::from(&account))
    }

    /// Activate a pending account from its verification token.
    ///
    /// Calling again with the same token succeeds without changes for as long
    /// as that token still holds the account's epoch.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<AccountDetail, AuthError> {
        let email = self.validator.extract_email(token).map_err(|e| {
            info!(reason = %e, "token_rejected");
            e.public()
        })?;
        let mut account = self.store.find_by_email(&email).await?.ok_or(AuthError::AccountNotFound)?;

        if let Err(e) = self.validator.validate(token, &account) {
            info!(email = %email, reason = %e, "token_rejected");
            return Err(AuthError::TokenInvalid);
        }

        if account.activate() {
            account = self.store.save(account).await?;
            info!(email = %email, "account_verified");
        } else {
            debug!(email = %email, status = %account.status, "verify on non-pending account");
        }
        Ok(AccountDetail::from(&account))
    }

    /// Issue a fresh token for an already-authenticated principal. The token the
    /// caller authenticated with stops validating once this returns.
    #[instrument(skip_all, fields(email = %principal.account().email))]
    pub async fn refresh(&self, principal: CurrentPrincipal) -> Result<AuthSession, AuthError> {
        let mut account = principal.into_account();
        let token = self.issuer.issue(&account.email, Map::new())?;
        account.fence(&token);
        let account = self.store.save(account).await?;
        info!(iat = token.issued_at, "session_refreshed");
        Ok(AuthSession::for_account(&account, token))
    }

    /// Resolve a bearer token to its account. Only active accounts whose
    /// current epoch matches the token are accepted.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, bearer: &str) -> Result<CurrentPrincipal, AuthError> {
        let email = self.validator.extract_email(bearer)?;
        let account = match self.store.find_by_email(&email).await? {
            Some(a) => a,
            None => {
                warn!(email = %email, "bearer token for unknown account");
                return Err(AuthError::TokenInvalid);
            }
        };
        if !account.is_active() {
            return Err(AuthError::AccountNotActive);
        }
        self.validator.validate(bearer, &account)?;
        Ok(CurrentPrincipal(account))
    }
}
