use anyhow::Context;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::{upstream_error, ServiceAccountKey};
use crate::providers::ProviderResult;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const ASSERTION_LIFETIME: u64 = 3600;

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// OAuth2 access tokens for the service account, cached until shortly
/// before expiry
pub struct AccessTokenSource {
    http: reqwest::Client,
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    cached: RwLock<Option<CachedToken>>,
}

impl AccessTokenSource {
    pub fn new(http: reqwest::Client, key: &ServiceAccountKey, token_uri: &str) -> anyhow::Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Invalid service account private key")?;

        Ok(Self {
            http,
            client_email: key.client_email.clone(),
            token_uri: token_uri.to_string(),
            key: encoding_key,
            cached: RwLock::new(None),
        })
    }

    /// Current bearer token, exchanging a fresh assertion when needed
    pub async fn token(&self) -> ProviderResult<String> {
        if let Some(token) = Self::usable(&*self.cached.read().await) {
            return Ok(token);
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = Self::usable(&cached) {
            return Ok(token);
        }

        let fresh = self.exchange().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn usable(cached: &Option<CachedToken>) -> Option<String> {
        cached
            .as_ref()
            .filter(|token| Instant::now() < token.refresh_at)
            .map(|token| token.value.clone())
    }

    fn assertion(&self) -> anyhow::Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("Failed to get current time")?
            .as_secs();

        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .context("Failed to sign token assertion")
    }

    async fn exchange(&self) -> ProviderResult<CachedToken> {
        let assertion = self.assertion()?;
        let requested_at = Instant::now();

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let body: TokenResponse = response.json().await?;
        tracing::debug!("Access token refreshed, valid for {}s", body.expires_in);

        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(REFRESH_MARGIN);
        Ok(CachedToken {
            value: body.access_token,
            refresh_at: requested_at + lifetime,
        })
    }
}
