use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{upstream_error, AccessTokenSource};
use crate::providers::{IdentityProvider, IdentityRecord, ProviderError, ProviderResult};
use crate::utils::CustomTokenSigner;

#[derive(Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    email: [&'a str; 1],
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Identity provider backed by the managed identity service
pub struct FirebaseIdentityProvider {
    http: reqwest::Client,
    accounts_url: String,
    tokens: Arc<AccessTokenSource>,
    signer: CustomTokenSigner,
}

impl FirebaseIdentityProvider {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        project_id: &str,
        tokens: Arc<AccessTokenSource>,
        signer: CustomTokenSigner,
    ) -> Self {
        Self {
            http,
            accounts_url: format!(
                "{}/v1/projects/{}/accounts",
                endpoint.trim_end_matches('/'),
                project_id
            ),
            tokens,
            signer,
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ProviderResult<reqwest::Response> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(response)
    }
}

fn first_match(lookup: LookupResponse, email: &str) -> ProviderResult<IdentityRecord> {
    lookup
        .users
        .into_iter()
        .next()
        .map(|account| IdentityRecord {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| email.to_string()),
        })
        .ok_or_else(|| ProviderError::UserNotFound(email.to_string()))
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> ProviderResult<IdentityRecord> {
        let response = self
            .post(&self.accounts_url, &CreateAccountRequest { email, password })
            .await?;
        let created: CreateAccountResponse = response.json().await?;

        tracing::info!("Account created: {}", created.local_id);
        Ok(IdentityRecord {
            uid: created.local_id,
            email: created.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<IdentityRecord> {
        let url = format!("{}:lookup", self.accounts_url);
        let response = self.post(&url, &LookupRequest { email: [email] }).await?;
        let lookup: LookupResponse = response.json().await?;

        first_match(lookup, email)
    }

    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String> {
        Ok(self.signer.sign(uid)?)
    }
}
