//! In-process identity registry and document store for development and testing

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{new_uid, DocumentStore, IdentityProvider, IdentityRecord, ProviderError, ProviderResult};
use crate::utils::{normalize_email, validate_email, CustomTokenSigner};

/// Identity registry keyed by lowercased email. Passwords are accepted as
/// given and not retained.
pub struct MemoryIdentityProvider {
    accounts: DashMap<String, IdentityRecord>,
    signer: CustomTokenSigner,
}

impl MemoryIdentityProvider {
    pub fn new(signer: CustomTokenSigner) -> Self {
        Self {
            accounts: DashMap::new(),
            signer,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> ProviderResult<IdentityRecord> {
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(ProviderError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(ProviderError::WeakPassword);
        }

        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => Err(ProviderError::EmailExists),
            Entry::Vacant(slot) => {
                let record = IdentityRecord {
                    uid: new_uid(),
                    email,
                };
                slot.insert(record.clone());
                tracing::debug!("Account created in memory: {}", record.uid);
                Ok(record)
            }
        }
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<IdentityRecord> {
        self.accounts
            .get(&normalize_email(email))
            .map(|record| record.value().clone())
            .ok_or_else(|| ProviderError::UserNotFound(email.to_string()))
    }

    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String> {
        Ok(self.signer.sign(uid)?)
    }
}

/// Document store keyed by (collection, id)
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<(String, String), serde_json::Value>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current body of `collection/id`
    pub fn document(&self, collection: &str, id: &str) -> Option<serde_json::Value> {
        self.documents
            .get(&(collection.to_string(), id.to_string()))
            .map(|doc| doc.value().clone())
    }

    /// Number of documents in `collection`
    pub fn count(&self, collection: &str) -> usize {
        self.documents
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: serde_json::Value,
    ) -> ProviderResult<()> {
        if !data.is_object() {
            return Err(ProviderError::InvalidDocument);
        }

        self.documents
            .insert((collection.to_string(), id.to_string()), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn identity() -> MemoryIdentityProvider {
        MemoryIdentityProvider::new(CustomTokenSigner::hs256("plateshare", "secret", 3600))
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let provider = identity();
        let created = provider.create_user("a@b.com", "secret1").await.unwrap();
        let found = provider.get_user_by_email("a@b.com").await.unwrap();

        assert_eq!(created, found);
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let provider = identity();
        assert_ok!(provider.create_user("a@b.com", "secret1").await);

        let err = provider.create_user("a@b.com", "secret2").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmailExists));
        assert_eq!(provider.len(), 1);
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive() {
        let provider = identity();
        let created = provider.create_user("A@b.com", "secret1").await.unwrap();
        assert_eq!(created.email, "a@b.com");

        let err = provider.create_user("a@B.COM", "secret2").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmailExists));
        assert_eq!(provider.len(), 1);

        assert_eq!(provider.get_user_by_email("a@b.com").await.unwrap(), created);
        assert_eq!(provider.get_user_by_email("A@B.COM").await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_identity_rules() {
        let provider = identity();

        let err = provider.create_user("not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidEmail));

        let err = provider.create_user("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, ProviderError::WeakPassword));

        assert!(provider.is_empty());
        assert_ok!(provider.create_user("a@b.com", "pw").await);
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let err = identity().get_user_by_email("ghost@b.com").await.unwrap_err();
        assert!(matches!(err, ProviderError::UserNotFound(ref email) if email == "ghost@b.com"));
    }

    #[tokio::test]
    async fn test_custom_token() {
        let token = identity().create_custom_token("uid-1").await.unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_set_document_replaces_whole_document() {
        let store = MemoryDocumentStore::new();
        assert_ok!(store.set_document("drivers", "u1", json!({ "name": "A", "availability": "available" })).await);
        assert_ok!(store.set_document("drivers", "u1", json!({ "name": "B" })).await);

        assert_eq!(store.document("drivers", "u1"), Some(json!({ "name": "B" })));
        assert_eq!(store.count("drivers"), 1);
        assert_eq!(store.count("users"), 0);
    }

    #[tokio::test]
    async fn test_set_document_requires_object() {
        let store = MemoryDocumentStore::new();
        assert_err!(store.set_document("users", "u1", json!("scalar")).await);
        assert!(store.document("users", "u1").is_none());
    }
}
