use async_trait::async_trait;

use super::domain::Account;
use super::errors::AuthError;

/// Durable account records keyed by email.
///
/// `save` inserts when the account has no id (assigning id and `created_at`)
/// and overwrites the whole record otherwise. An insert whose email is already
/// taken fails with `AuthError::AccountAlreadyExists`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;
    async fn save(&self, account: Account) -> Result<Account, AuthError>;
}

/// Simple in-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    #[derive(Default)]
    pub struct InMemoryAccountStore {
        accounts: RwLock<HashMap<String, Account>>, // key: email
    }

    impl InMemoryAccountStore {
        pub async fn len(&self) -> usize {
            self.accounts.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.accounts.read().await.is_empty()
        }

        /// Store a record as-is, bypassing the insert rules. Test seeding only.
        pub async fn put(&self, account: Account) {
            self.accounts.write().await.insert(account.email.clone(), account);
        }
    }

    #[async_trait]
    impl AccountStore for InMemoryAccountStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
            let accounts = self.accounts.read().await;
            Ok(accounts.get(email).cloned())
        }

        async fn save(&self, mut account: Account) -> Result<Account, AuthError> {
            let mut accounts = self.accounts.write().await;
            let now = Utc::now();
            if !account.is_persisted() {
                if accounts.contains_key(&account.email) {
                    return Err(AuthError::AccountAlreadyExists(account.email));
                }
                account.id = Some(Uuid::new_v4());
                account.created_at = Some(now);
            }
            account.updated_at = Some(now);
            accounts.insert(account.email.clone(), account.clone());
            Ok(account)
        }
    }

}
