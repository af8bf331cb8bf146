use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{load_owned, AppState, CurrentUser, ValidatedJson};
use crate::error::{duplicate_as, missing_as, AppError, MessageResponse, ValidationErrorResponse};
use crate::models::CoreValues;

const NOT_FOUND: &str = "Core values not found";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValuesRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Values are required"))]
    pub values: Vec<String>,
}

/// GET /api/values
#[utoipa::path(
    get,
    path = "/api/values",
    tag = "values",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's core values", body = CoreValues),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 404, description = "No core values yet", body = MessageResponse),
    )
)]
pub async fn get_values_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<CoreValues>, AppError> {
    state
        .storage
        .core_values()
        .find_one_by_owner(user.id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// POST /api/values
#[utoipa::path(
    post,
    path = "/api/values",
    tag = "values",
    security(("bearer_auth" = [])),
    request_body = ValuesRequest,
    responses(
        (status = 200, description = "Created", body = CoreValues),
        (status = 400, description = "Invalid input or already present", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn create_values_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ValuesRequest>,
) -> Result<Json<CoreValues>, AppError> {
    let now = Utc::now();
    let record = CoreValues {
        id: Uuid::new_v4(),
        user_id: user.id,
        values: payload.values,
        created_at: now,
        updated_at: now,
    };
    state
        .storage
        .core_values()
        .insert(&record)
        .map_err(duplicate_as("Core values already exist"))?;

    tracing::info!(user_id = %user.id, id = %record.id, "Core values created");
    Ok(Json(record))
}

/// PUT /api/values/:id
#[utoipa::path(
    put,
    path = "/api/values/{id}",
    tag = "values",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Core values id")),
    request_body = ValuesRequest,
    responses(
        (status = 200, description = "Updated", body = CoreValues),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn update_values_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ValuesRequest>,
) -> Result<Json<CoreValues>, AppError> {
    let mut record = load_owned(state.storage.core_values(), &id, user, NOT_FOUND)?;
    record.values = payload.values;
    record.updated_at = Utc::now();
    state
        .storage
        .core_values()
        .replace(&record)
        .map_err(missing_as(NOT_FOUND))?;
    Ok(Json(record))
}

/// DELETE /api/values/:id
#[utoipa::path(
    delete,
    path = "/api/values/{id}",
    tag = "values",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Core values id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn delete_values_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = load_owned(state.storage.core_values(), &id, user, NOT_FOUND)?;
    state.storage.core_values().remove(record.id)?;
    tracing::info!(user_id = %user.id, id = %record.id, "Core values removed");
    Ok(Json(MessageResponse::new("Core values removed")))
}
