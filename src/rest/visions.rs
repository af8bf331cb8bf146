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
use crate::models::{Timeframe, Vision};
use crate::validation::{validate_not_blank, validate_timeframe};

const NOT_FOUND: &str = "Vision not found";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVisionRequest {
    /// One of `10-year`, `3-year`, `1-year`
    #[serde(default)]
    #[validate(custom(
        function = "validate_timeframe",
        message = "Timeframe must be 10-year, 3-year, or 1-year"
    ))]
    pub timeframe: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVisionRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,
}

/// GET /api/visions
#[utoipa::path(
    get,
    path = "/api/visions",
    tag = "visions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's visions, longest timeframe first", body = [Vision]),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn list_visions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Vision>>, AppError> {
    let mut visions = state.storage.visions().find_by_owner(user.id)?;
    visions.sort_by_key(|v| v.timeframe);
    Ok(Json(visions))
}

/// POST /api/visions
#[utoipa::path(
    post,
    path = "/api/visions",
    tag = "visions",
    security(("bearer_auth" = [])),
    request_body = CreateVisionRequest,
    responses(
        (status = 200, description = "Created", body = Vision),
        (status = 400, description = "Invalid input or timeframe taken", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn create_vision_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateVisionRequest>,
) -> Result<Json<Vision>, AppError> {
    let timeframe: Timeframe = payload
        .timeframe
        .parse()
        .map_err(|_| AppError::field("timeframe", "Timeframe must be 10-year, 3-year, or 1-year"))?;

    let now = Utc::now();
    let record = Vision {
        id: Uuid::new_v4(),
        user_id: user.id,
        timeframe,
        description: payload.description,
        created_at: now,
        updated_at: now,
    };
    state
        .storage
        .visions()
        .insert(&record)
        .map_err(duplicate_as(format!("A {timeframe} vision already exists")))?;

    tracing::info!(user_id = %user.id, id = %record.id, %timeframe, "Vision created");
    Ok(Json(record))
}

/// PUT /api/visions/:id
#[utoipa::path(
    put,
    path = "/api/visions/{id}",
    tag = "visions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Vision id")),
    request_body = UpdateVisionRequest,
    responses(
        (status = 200, description = "Updated", body = Vision),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn update_vision_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateVisionRequest>,
) -> Result<Json<Vision>, AppError> {
    let mut record = load_owned(state.storage.visions(), &id, user, NOT_FOUND)?;
    record.description = payload.description;
    record.updated_at = Utc::now();
    state
        .storage
        .visions()
        .replace(&record)
        .map_err(missing_as(NOT_FOUND))?;
    Ok(Json(record))
}

/// DELETE /api/visions/:id
#[utoipa::path(
    delete,
    path = "/api/visions/{id}",
    tag = "visions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Vision id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn delete_vision_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = load_owned(state.storage.visions(), &id, user, NOT_FOUND)?;
    state.storage.visions().remove(record.id)?;
    tracing::info!(user_id = %user.id, id = %record.id, "Vision removed");
    Ok(Json(MessageResponse::new("Vision removed")))
}
