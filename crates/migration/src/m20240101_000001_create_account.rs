//! Create `account` table.
//!
//! `email` carries the uniqueness constraint the account store relies on to
//! reject duplicate registrations. `token_epoch` holds the `iat` (seconds) of
//! the only session token currently accepted for the account.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(uuid(Account::Id).primary_key())
                    .col(string_len(Account::FirstName, 90).not_null())
                    .col(string_len(Account::LastName, 90).not_null())
                    .col(string_len(Account::Email, 130).unique_key().not_null())
                    .col(string_len(Account::PasswordHash, 255).not_null())
                    .col(string_len(Account::Status, 16).not_null())
                    .col(
                        ColumnDef::new(Account::PendingVerificationToken)
                            .string_len(512)
                            .null(),
                    )
                    .col(ColumnDef::new(Account::TokenEpoch).big_integer().null())
                    .col(timestamp_with_time_zone(Account::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Account::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Account::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    PasswordHash,
    Status,
    PendingVerificationToken,
    TokenEpoch,
    CreatedAt,
    UpdatedAt,
}
