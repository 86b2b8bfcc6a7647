use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};

use super::{new_uid, DocumentStore, IdentityProvider, IdentityRecord, ProviderError, ProviderResult};
use crate::models::{account, document};
use crate::utils::{hash_password, normalize_email, validate_email, validate_password, CustomTokenSigner};

/// Identity registry persisted in the `accounts` table
pub struct PostgresIdentityProvider {
    db: DatabaseConnection,
    signer: CustomTokenSigner,
}

impl PostgresIdentityProvider {
    pub fn new(db: DatabaseConnection, signer: CustomTokenSigner) -> Self {
        Self { db, signer }
    }
}

impl From<account::Model> for IdentityRecord {
    fn from(model: account::Model) -> Self {
        Self {
            uid: model.uid,
            email: model.email,
        }
    }
}

// A concurrent registration can still win the race past the lookup
fn map_insert_error(err: DbErr) -> ProviderError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ProviderError::EmailExists,
        _ => ProviderError::Database(err),
    }
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> ProviderResult<IdentityRecord> {
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(ProviderError::InvalidEmail);
        }
        if !validate_password(password) {
            return Err(ProviderError::WeakPassword);
        }

        let existing = account::Entity::find()
            .filter(account::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(ProviderError::EmailExists);
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task failed")??;

        let account = account::ActiveModel {
            uid: Set(new_uid()),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(map_insert_error)?;

        tracing::info!("Account created: {}", account.uid);
        Ok(account.into())
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<IdentityRecord> {
        account::Entity::find()
            .filter(account::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?
            .map(IdentityRecord::from)
            .ok_or_else(|| ProviderError::UserNotFound(email.to_string()))
    }

    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String> {
        Ok(self.signer.sign(uid)?)
    }
}

/// Document store persisted in the `documents` table
pub struct PostgresDocumentStore {
    db: DatabaseConnection,
}

impl PostgresDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: serde_json::Value,
    ) -> ProviderResult<()> {
        if !data.is_object() {
            return Err(ProviderError::InvalidDocument);
        }

        let row = document::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.to_string()),
            data: Set(data),
            updated_at: Set(Utc::now()),
        };

        document::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([document::Column::Collection, document::Column::Id])
                    .update_columns([document::Column::Data, document::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        tracing::debug!("Document written: {}/{}", collection, id);
        Ok(())
    }
}
