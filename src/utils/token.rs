use anyhow::{Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Audience the managed identity service expects on custom tokens
pub const IDENTITY_TOOLKIT_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// Longest lifetime the managed identity service accepts for a custom token
pub const MAX_CUSTOM_TOKEN_LIFETIME: u64 = 3600;

/// Custom token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    /// User the token is minted for
    pub uid: String,
}

/// Signs custom tokens for a given uid
pub struct CustomTokenSigner {
    issuer: String,
    audience: String,
    key: EncodingKey,
    algorithm: Algorithm,
    lifetime_seconds: u64,
}

impl CustomTokenSigner {
    /// Shared-secret signer used by the local backends
    pub fn hs256(issuer: &str, secret: &str, lifetime_seconds: u64) -> Self {
        Self {
            issuer: issuer.to_string(),
            audience: issuer.to_string(),
            key: EncodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            lifetime_seconds,
        }
    }

    /// Service-account signer producing tokens the managed identity service accepts
    pub fn rs256(client_email: &str, private_key_pem: &str) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .context("Invalid service account private key")?;

        Ok(Self {
            issuer: client_email.to_string(),
            audience: IDENTITY_TOOLKIT_AUDIENCE.to_string(),
            key,
            algorithm: Algorithm::RS256,
            lifetime_seconds: MAX_CUSTOM_TOKEN_LIFETIME,
        })
    }

    /// Mint a signed token for `uid`
    pub fn sign(&self, uid: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("Failed to get current time")?
            .as_secs();

        let claims = CustomTokenClaims {
            iss: self.issuer.clone(),
            sub: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.lifetime_seconds,
            uid: uid.to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.key)
            .context("Failed to encode custom token")
    }
}
