use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Account lifecycle. Only `Pending -> Active` is driven by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Pending,
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "PENDING",
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity record as seen by the auth core.
///
/// Records loaded from storage are built with a plain struct literal; records
/// that do not exist yet come from [`Account::new_pending`] and carry no id or
/// timestamps until the store assigns them on first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: AccountStatus,
    pub pending_verification_token: Option<String>,
    /// `iat` (seconds) of the only session token currently accepted.
    pub token_epoch: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new_pending(first_name: &str, last_name: &str, email: &str, password_hash: String) -> Self {
        Self {
            id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash,
            status: AccountStatus::Pending,
            pending_verification_token: None,
            token_epoch: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Record `token` as the account's current session; every earlier token stops validating.
    pub fn fence(&mut self, token: &SessionToken) {
        self.token_epoch = Some(token.issued_at);
    }

    /// `Pending -> Active`. Returns false when the account was not pending.
    pub fn activate(&mut self) -> bool {
        if self.status != AccountStatus::Pending {
            return false;
        }
        self.status = AccountStatus::Active;
        self.pending_verification_token = None;
        true
    }
}

/// Account resolved from a bearer token by the request authenticator.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrincipal(pub Account);

impl CurrentPrincipal {
    pub fn account(&self) -> &Account {
        &self.0
    }

    pub fn into_account(self) -> Account {
        self.0
    }
}

/// A freshly issued, signed token. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub email: String,
    /// Seconds since the epoch.
    pub issued_at: i64,
    /// Seconds since the epoch.
    pub expires_at: i64,
    pub expiration_ms: u64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra_claims: Map<String, Value>,
}

impl SessionToken {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs > self.expires_at
    }

    pub fn remaining_ms_at(&self, now_millis: i64) -> i64 {
        (self.expires_at * 1000 - now_millis).max(0)
    }
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Result of login and refresh: the new token plus the account's display fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub token: SessionToken,
    pub name: String,
    pub last_name: String,
    pub email: String,
}

impl AuthSession {
    pub fn for_account(account: &Account, token: SessionToken) -> Self {
        Self {
            token,
            name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
        }
    }
}

/// Summary returned by registration. `token` is the verification token the caller delivers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub status: AccountStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub token: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            email: a.email.clone(),
            status: a.status,
            created_at: a.created_at,
            token: a.pending_verification_token.clone(),
        }
    }
}

/// Minimal public view returned by verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&Account> for AccountDetail {
    fn from(a: &Account) -> Self {
        Self { name: a.first_name.clone(), last_name: a.last_name.clone(), email: a.email.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(iat: i64, exp: i64) -> SessionToken {
        SessionToken {
            token: "t".into(),
            email: "a@b.com".into(),
            issued_at: iat,
            expires_at: exp,
            expiration_ms: ((exp - iat) * 1000) as u64,
            extra_claims: Map::new(),
        }
    }

    #[test]
    fn status_display_matches_wire_form() {
        for s in [AccountStatus::Pending, AccountStatus::Active, AccountStatus::Inactive] {
            assert_eq!(serde_json::to_string(&s).unwrap(), format!("\"{s}\""));
        }
        assert_eq!(AccountStatus::Inactive.to_string(), "INACTIVE");
    }

    #[test]
    fn new_pending_is_unpersisted() {
        let a = Account::new_pending("Ada", "Lovelace", "ada@x.com", "h".into());
        assert!(!a.is_persisted());
        assert_eq!(a.status, AccountStatus::Pending);
        assert!(a.token_epoch.is_none());
    }

    #[test]
    fn activate_only_from_pending() {
        let mut a = Account::new_pending("Ada", "Lovelace", "ada@x.com", "h".into());
        a.pending_verification_token = Some("v".into());
        assert!(a.activate());
        assert_eq!(a.status, AccountStatus::Active);
        assert!(a.pending_verification_token.is_none());
        assert!(!a.activate());

        a.status = AccountStatus::Inactive;
        assert!(!a.activate());
        assert_eq!(a.status, AccountStatus::Inactive);
    }

    #[test]
    fn fence_overwrites_epoch() {
        let mut a = Account::new_pending("Ada", "Lovelace", "ada@x.com", "h".into());
        a.fence(&token(1000, 2000));
        a.fence(&token(1500, 2500));
        assert_eq!(a.token_epoch, Some(1500));
    }

    #[test]
    fn session_token_expiry_projections() {
        let t = token(1000, 1060);
        assert!(!t.is_expired_at(1060));
        assert!(t.is_expired_at(1061));
        assert_eq!(t.remaining_ms_at(1_059_500), 500);
        assert_eq!(t.remaining_ms_at(2_000_000), 0);
    }
}
