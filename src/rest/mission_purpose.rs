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
use crate::models::MissionPurpose;
use crate::validation::validate_not_blank;

const NOT_FOUND: &str = "Mission and purpose not found";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MissionPurposeRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Mission is required"))]
    pub mission: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Purpose is required"))]
    pub purpose: String,
}

/// GET /api/mission-purpose
#[utoipa::path(
    get,
    path = "/api/mission-purpose",
    tag = "mission-purpose",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's mission and purpose", body = MissionPurpose),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 404, description = "Nothing recorded yet", body = MessageResponse),
    )
)]
pub async fn get_mission_purpose_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MissionPurpose>, AppError> {
    state
        .storage
        .mission_purposes()
        .find_one_by_owner(user.id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// POST /api/mission-purpose
#[utoipa::path(
    post,
    path = "/api/mission-purpose",
    tag = "mission-purpose",
    security(("bearer_auth" = [])),
    request_body = MissionPurposeRequest,
    responses(
        (status = 200, description = "Created", body = MissionPurpose),
        (status = 400, description = "Invalid input or already present", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn create_mission_purpose_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<MissionPurposeRequest>,
) -> Result<Json<MissionPurpose>, AppError> {
    let now = Utc::now();
    let record = MissionPurpose {
        id: Uuid::new_v4(),
        user_id: user.id,
        mission: payload.mission,
        purpose: payload.purpose,
        created_at: now,
        updated_at: now,
    };
    state
        .storage
        .mission_purposes()
        .insert(&record)
        .map_err(duplicate_as("Mission and purpose already exist"))?;

    tracing::info!(user_id = %user.id, id = %record.id, "Mission and purpose created");
    Ok(Json(record))
}

/// PUT /api/mission-purpose/:id
#[utoipa::path(
    put,
    path = "/api/mission-purpose/{id}",
    tag = "mission-purpose",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Mission and purpose id")),
    request_body = MissionPurposeRequest,
    responses(
        (status = 200, description = "Updated", body = MissionPurpose),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn update_mission_purpose_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MissionPurposeRequest>,
) -> Result<Json<MissionPurpose>, AppError> {
    let mut record = load_owned(state.storage.mission_purposes(), &id, user, NOT_FOUND)?;
    record.mission = payload.mission;
    record.purpose = payload.purpose;
    record.updated_at = Utc::now();
    state
        .storage
        .mission_purposes()
        .replace(&record)
        .map_err(missing_as(NOT_FOUND))?;
    Ok(Json(record))
}

/// DELETE /api/mission-purpose/:id
#[utoipa::path(
    delete,
    path = "/api/mission-purpose/{id}",
    tag = "mission-purpose",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Mission and purpose id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn delete_mission_purpose_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = load_owned(state.storage.mission_purposes(), &id, user, NOT_FOUND)?;
    state.storage.mission_purposes().remove(record.id)?;
    tracing::info!(user_id = %user.id, id = %record.id, "Mission and purpose removed");
    Ok(Json(MessageResponse::new("Mission and purpose removed")))
}
