use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::profile::USERS_COLLECTION;
use crate::models::{RoleRecord, UserProfile};
use crate::providers::{DocumentStore, IdentityProvider};

/// Registration and login on top of the identity provider and document store
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

/// Registration input, required fields already checked
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub address: Option<String>,
}

/// Login response with custom token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

impl AuthService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    /// Create the account, its profile document and, for known roles, the
    /// role-specific record. Returns the new uid.
    ///
    /// Writes are not rolled back: a failed role record leaves the account
    /// and profile in place.
    pub async fn register(&self, input: RegistrationInput) -> Result<String> {
        let account = self
            .identity
            .create_user(&input.email, &input.password)
            .await?;
        let uid = account.uid;

        let profile = UserProfile {
            uid: uid.clone(),
            email: input.email,
            role: input.role,
            name: input.name,
            address: input.address,
        };

        let profile_doc = serde_json::to_value(&profile).context("Failed to encode profile")?;
        self.store
            .set_document(USERS_COLLECTION, &uid, profile_doc)
            .await?;

        match RoleRecord::for_profile(&profile) {
            Some((collection, record)) => {
                let record_doc = serde_json::to_value(&record).context("Failed to encode role record")?;
                if let Err(e) = self.store.set_document(collection, &uid, record_doc).await {
                    tracing::warn!(
                        uid = %uid,
                        collection,
                        "Role record write failed, profile left in place: {}",
                        e
                    );
                    return Err(e.into());
                }
            }
            None => {
                tracing::debug!("No role record for role {:?}", profile.role);
            }
        }

        tracing::info!("User registered: {} as {}", uid, profile.role);
        Ok(uid)
    }

    /// Look up the account by email and mint a custom token for it.
    /// No password is checked here.
    pub async fn login(&self, email: &str) -> Result<LoginResponse> {
        let account = self.identity.get_user_by_email(email).await?;
        let token = self.identity.create_custom_token(&account.uid).await?;

        tracing::info!("Custom token issued for {}", account.uid);
        Ok(LoginResponse { token })
    }
}
