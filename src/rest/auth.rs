use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{AppState, CurrentUser, ValidatedJson};
use crate::auth::verify_password;
use crate::error::{duplicate_as, AppError, MessageResponse, ValidationErrorResponse};
use crate::models::{User, UserProfile};
use crate::validation::validate_not_blank;

const USER_EXISTS: &str = "User already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Please enter a password with 6 or more characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run a blocking bcrypt call off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, crate::auth::AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid input or email taken", body = ValidationErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = normalize_email(&payload.email);
    if state.storage.users().find_by_unique(&email)?.is_some() {
        return Err(AppError::BadRequest(USER_EXISTS.to_string()));
    }

    let authenticator = state.auth.clone();
    let password = payload.password;
    let password_hash = blocking(move || authenticator.hash_password(&password)).await?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email,
        password_hash,
        created_at: now,
        updated_at: now,
    };
    // A concurrent registration can still win the race; the unique index decides
    state
        .storage
        .users()
        .insert(&user)
        .map_err(duplicate_as(USER_EXISTS))?;

    let token = state.auth.issue_token(user.id)?;
    tracing::info!(user_id = %user.id, "User registered");
    Ok(Json(TokenResponse { token }))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 400, description = "Invalid input or credentials", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .storage
        .users()
        .find_by_unique(&normalize_email(&payload.email))?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    let password = payload.password;
    let hash = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &hash)).await? {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.auth.issue_token(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(TokenResponse { token }))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile of the caller", body = UserProfile),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse),
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, AppError> {
    let account = state
        .storage
        .users()
        .get(user.id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(UserProfile::from(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_register_request_rules() {
        let ok = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            name: "   ".into(),
            email: "ada".into(),
            password: "12345".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_err());
    }
}
