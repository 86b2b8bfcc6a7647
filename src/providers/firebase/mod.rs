//! Managed identity and document service reached over its REST APIs

mod access_token;
mod credentials;
mod firestore;
mod identity;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

pub use access_token::AccessTokenSource;
pub use credentials::ServiceAccountKey;
pub use firestore::FirestoreDocumentStore;
pub use identity::FirebaseIdentityProvider;

use super::ProviderError;
use crate::utils::config::FirebaseConfig;
use crate::utils::CustomTokenSigner;

/// Build both collaborators from one service-account key, sharing the
/// HTTP client and access-token cache
pub fn connect(config: &FirebaseConfig) -> Result<(FirebaseIdentityProvider, FirestoreDocumentStore)> {
    let key = ServiceAccountKey::from_file(&config.credentials_path)?;

    let project_id = if config.project_id.is_empty() {
        key.project_id.clone()
    } else {
        config.project_id.clone()
    };
    let token_uri = if config.token_endpoint.is_empty() {
        key.token_uri.clone()
    } else {
        config.token_endpoint.clone()
    };

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let tokens = Arc::new(AccessTokenSource::new(http.clone(), &key, &token_uri)?);
    let signer = CustomTokenSigner::rs256(&key.client_email, &key.private_key)?;

    tracing::info!("Using managed identity backend for project {}", project_id);

    let identity = FirebaseIdentityProvider::new(
        http.clone(),
        &config.auth_endpoint,
        &project_id,
        tokens.clone(),
        signer,
    );
    let store = FirestoreDocumentStore::new(http, &config.firestore_endpoint, &project_id, tokens);

    Ok((identity, store))
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a REST error body onto a provider error
fn parse_error_body(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => return ProviderError::Upstream(format!("{}: {}", status, body.trim())),
    };

    // Codes may carry a detail suffix, e.g. "WEAK_PASSWORD : Password should be ..."
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => ProviderError::EmailExists,
        "INVALID_EMAIL" => ProviderError::InvalidEmail,
        "WEAK_PASSWORD" | "INVALID_PASSWORD" => ProviderError::WeakPassword,
        _ => ProviderError::Upstream(message),
    }
}

async fn upstream_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    match response.text().await {
        Ok(body) => parse_error_body(status, &body),
        Err(e) => ProviderError::Http(e),
    }
}
