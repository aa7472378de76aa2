use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set, SqlErr};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_INACTIVE: &str = "INACTIVE";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub status: String,
    pub pending_verification_token: Option<String>,
    pub token_epoch: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Every column marked `Set`, so inserts and updates write the whole row.
fn into_full_active(m: Model) -> ActiveModel {
    ActiveModel {
        id: Set(m.id),
        first_name: Set(m.first_name),
        last_name: Set(m.last_name),
        email: Set(m.email),
        password_hash: Set(m.password_hash),
        status: Set(m.status),
        pending_verification_token: Set(m.pending_verification_token),
        token_epoch: Set(m.token_epoch),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && trimmed.len() <= 130 => Ok(()),
        _ => Err(ModelError::Validation("email should be valid".into())),
    }
}

/// Names must be 2..=30 characters after trimming.
pub fn validate_name(field: &str, name: &str) -> Result<(), ModelError> {
    let len = name.trim().chars().count();
    if !(2..=30).contains(&len) {
        return Err(ModelError::Validation(format!("{field} must be between 2 and 30 characters long")));
    }
    Ok(())
}

fn map_db_err(e: DbErr) -> ModelError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => ModelError::Conflict(msg),
        _ => ModelError::Db(e.to_string()),
    }
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.to_string()))
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Insert a fully-populated row; a duplicate email surfaces as `ModelError::Conflict`.
pub async fn insert(db: &DatabaseConnection, model: Model) -> Result<Model, ModelError> {
    into_full_active(model).insert(db).await.map_err(map_db_err)
}

/// Overwrite every column of an existing row.
pub async fn update(db: &DatabaseConnection, model: Model) -> Result<Model, ModelError> {
    into_full_active(model).update(db).await.map_err(map_db_err)
}
