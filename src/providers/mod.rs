//! Identity provider and document store seams, with their backends

pub mod firebase;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use firebase::{FirebaseIdentityProvider, FirestoreDocumentStore};
pub use memory::{MemoryDocumentStore, MemoryIdentityProvider};
pub use postgres::{PostgresDocumentStore, PostgresIdentityProvider};

/// Errors raised by identity and storage collaborators.
/// The display string is what registration reports back to the client.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("The user with the provided email already exists (EMAIL_EXISTS).")]
    EmailExists,

    #[error("The email address is improperly formatted (INVALID_EMAIL).")]
    InvalidEmail,

    #[error("The password must be a string with at least 6 characters (WEAK_PASSWORD).")]
    WeakPassword,

    #[error("No user record found for the provided email: {0}")]
    UserNotFound(String),

    #[error("Document data must be a JSON object")]
    InvalidDocument,

    #[error("{0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Account as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: String,
}

/// Issues and looks up user accounts and mints custom tokens
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, email: &str, password: &str) -> ProviderResult<IdentityRecord>;
    async fn get_user_by_email(&self, email: &str) -> ProviderResult<IdentityRecord>;
    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String>;
}

/// Per-collection document writes with whole-document replace semantics
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: serde_json::Value,
    ) -> ProviderResult<()>;
}

/// Fresh user identifier for the local backends
pub(crate) fn new_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uid_is_compact_and_unique() {
        let first = new_uid();
        let second = new_uid();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_error_messages() {
        assert!(ProviderError::EmailExists.to_string().contains("EMAIL_EXISTS"));
        assert_eq!(
            ProviderError::Upstream("PERMISSION_DENIED".to_string()).to_string(),
            "PERMISSION_DENIED"
        );

        let wrapped: ProviderError = anyhow::anyhow!("signing failed").into();
        assert_eq!(wrapped.to_string(), "signing failed");
    }
}
