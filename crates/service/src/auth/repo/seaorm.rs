use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use models::account;
use models::errors::ModelError;

use crate::auth::domain::{Account, AccountStatus};
use crate::auth::errors::AuthError;
use crate::auth::repository::AccountStore;

pub struct SeaOrmAccountStore {
    pub db: DatabaseConnection,
}

fn status_column(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Pending => account::STATUS_PENDING,
        AccountStatus::Active => account::STATUS_ACTIVE,
        AccountStatus::Inactive => account::STATUS_INACTIVE,
    }
}

fn status_from_column(raw: &str) -> Result<AccountStatus, AuthError> {
    match raw {
        account::STATUS_PENDING => Ok(AccountStatus::Pending),
        account::STATUS_ACTIVE => Ok(AccountStatus::Active),
        account::STATUS_INACTIVE => Ok(AccountStatus::Inactive),
        other => Err(AuthError::Repository(format!("unknown account status {other:?}"))),
    }
}

fn to_domain(m: account::Model) -> Result<Account, AuthError> {
    let status = status_from_column(&m.status)?;
    Ok(Account {
        id: Some(m.id),
        first_name: m.first_name,
        last_name: m.last_name,
        email: m.email,
        password_hash: m.password_hash,
        status,
        pending_verification_token: m.pending_verification_token,
        token_epoch: m.token_epoch,
        created_at: Some(m.created_at.with_timezone(&Utc)),
        updated_at: Some(m.updated_at.with_timezone(&Utc)),
    })
}

fn map_model_err(e: ModelError, email: &str) -> AuthError {
    match e {
        ModelError::Conflict(_) => AuthError::AccountAlreadyExists(email.to_string()),
        other => AuthError::Repository(other.to_string()),
    }
}

#[async_trait::async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let found = account::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        found.map(to_domain).transpose()
    }

    async fn save(&self, a: Account) -> Result<Account, AuthError> {
        let now = Utc::now();
        let email = a.email.clone();
        let persisted = a.is_persisted();
        let row = account::Model {
            id: a.id.unwrap_or_else(Uuid::new_v4),
            first_name: a.first_name,
            last_name: a.last_name,
            email: a.email,
            password_hash: a.password_hash,
            status: status_column(a.status).to_string(),
            pending_verification_token: a.pending_verification_token,
            token_epoch: a.token_epoch,
            created_at: a.created_at.unwrap_or(now).into(),
            updated_at: now.into(),
        };
        let saved = if persisted {
            account::update(&self.db, row).await
        } else {
            account::insert(&self.db, row).await
        }
        .map_err(|e| map_model_err(e, &email))?;
        to_domain(saved)
    }
}
