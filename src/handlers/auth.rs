use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::services::auth::{AuthService, LoginResponse, RegistrationInput};
use crate::utils::error::ApiError;
use crate::AppState;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid credentials or user not found";

// Absent, null and "" all count as missing
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Register request with validation
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequestBody {
    #[serde(default, deserialize_with = "nullable_string")]
    #[validate(length(min = 1))]
    email: String,

    #[serde(default, deserialize_with = "nullable_string")]
    #[validate(length(min = 1))]
    password: String,

    #[serde(default, deserialize_with = "nullable_string")]
    #[validate(length(min = 1))]
    role: String,

    #[serde(default, deserialize_with = "nullable_string")]
    #[validate(length(min = 1))]
    name: String,

    #[serde(default)]
    address: Option<String>,
}

impl From<RegisterRequestBody> for RegistrationInput {
    fn from(body: RegisterRequestBody) -> Self {
        Self {
            email: body.email,
            password: body.password,
            role: body.role,
            name: body.name,
            address: body.address,
        }
    }
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    message: String,
    uid: String,
}

/// Register endpoint
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(payload) = payload?;

    payload.validate().map_err(|e| {
        tracing::debug!("Registration rejected: {}", e);
        ApiError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())
    })?;

    tracing::debug!("Register endpoint called with email: {}", payload.email);

    let service = AuthService::new(state.identity.clone(), state.store.clone());
    let uid = service.register(payload.into()).await.map_err(|e| {
        tracing::warn!("Failed to register user: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            uid,
        }),
    ))
}

/// Login request; only the email is used
#[derive(Debug, Deserialize)]
pub struct LoginRequestBody {
    #[serde(default)]
    email: Option<String>,
}

/// Login endpoint
///
/// Issues a custom token for the account registered under `email`. Every
/// failure answers with the same message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequestBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Login body rejected: {}", rejection.body_text());
        ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string())
    })?;

    let email = payload
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()))?;

    let service = AuthService::new(state.identity.clone(), state.store.clone());
    let result = service.login(&email).await.map_err(|e| {
        tracing::warn!("Login failed for {}: {}", email, e);
        ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string())
    })?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_body_complete() {
        let body: RegisterRequestBody = serde_json::from_str(
            r#"{ "email": "a@b.com", "password": "pw", "role": "restaurant", "name": "Shop", "address": "1 Main St" }"#,
        )
        .unwrap();

        assert!(body.validate().is_ok());
        let input = RegistrationInput::from(body);
        assert_eq!(input.role, "restaurant");
        assert_eq!(input.address.as_deref(), Some("1 Main St"));
    }

    #[test]
    fn test_register_body_address_optional() {
        let body: RegisterRequestBody = serde_json::from_str(
            r#"{ "email": "a@b.com", "password": "pw", "role": "driver", "name": "Dee" }"#,
        )
        .unwrap();

        assert!(body.validate().is_ok());
        assert!(body.address.is_none());
    }

    #[test]
    fn test_register_body_missing_null_or_empty_fields() {
        for json in [
            r#"{ "password": "pw", "role": "driver", "name": "Dee" }"#,
            r#"{ "email": null, "password": "pw", "role": "driver", "name": "Dee" }"#,
            r#"{ "email": "a@b.com", "password": "", "role": "driver", "name": "Dee" }"#,
            r#"{ "email": "a@b.com", "password": "pw", "name": "Dee" }"#,
            r#"{ "email": "a@b.com", "password": "pw", "role": "driver", "name": "" }"#,
        ] {
            let body: RegisterRequestBody = serde_json::from_str(json).unwrap();
            assert!(body.validate().is_err(), "expected rejection for {}", json);
        }
    }

    #[test]
    fn test_login_body_without_email() {
        let body: LoginRequestBody = serde_json::from_str("{}").unwrap();
        assert!(body.email.is_none());
    }
}
