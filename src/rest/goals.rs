use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{load_owned, AppState, CurrentUser, ValidatedJson};
use crate::error::{missing_as, AppError, MessageResponse, ValidationErrorResponse};
use crate::models::{Goal, GoalStatus, DEFAULT_GOAL_TYPE};
use crate::validation::{parse_datetime, validate_goal_status, validate_iso_date, validate_not_blank};

const NOT_FOUND: &str = "Goal not found";
const BAD_DUE_DATE: &str = "Due date must be a valid date";
const BAD_STATUS: &str = "Status must be either in progress or completed";

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,
    /// ISO 8601 date or timestamp
    #[serde(default)]
    #[validate(custom(function = "validate_iso_date", message = "Due date is required"))]
    pub due_date: String,
    /// Free text, `quarterly` when omitted
    #[serde(rename = "type")]
    pub goal_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_goal_status", message = "Status must be either in progress or completed"))]
    pub status: Option<String>,
    #[validate(custom(function = "validate_iso_date", message = "Due date must be a valid date"))]
    pub due_date: Option<String>,
    #[serde(rename = "type")]
    pub goal_type: Option<String>,
}

fn due_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_datetime(raw).ok_or_else(|| AppError::field("dueDate", BAD_DUE_DATE))
}

fn goal_type(raw: Option<String>) -> Option<String> {
    raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// GET /api/goals
#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "goals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's goals, earliest due date first", body = [Goal]),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn list_goals_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Goal>>, AppError> {
    let mut goals = state.storage.goals().find_by_owner(user.id)?;
    goals.sort_by_key(|g| g.due_date);
    Ok(Json(goals))
}

/// POST /api/goals
#[utoipa::path(
    post,
    path = "/api/goals",
    tag = "goals",
    security(("bearer_auth" = [])),
    request_body = CreateGoalRequest,
    responses(
        (status = 200, description = "Created", body = Goal),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn create_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateGoalRequest>,
) -> Result<Json<Goal>, AppError> {
    let now = Utc::now();
    let record = Goal {
        id: Uuid::new_v4(),
        user_id: user.id,
        goal_type: goal_type(payload.goal_type).unwrap_or_else(|| DEFAULT_GOAL_TYPE.to_string()),
        description: payload.description,
        status: GoalStatus::InProgress,
        due_date: due_date(&payload.due_date)?,
        created_at: now,
        updated_at: now,
    };
    state.storage.goals().insert(&record)?;

    tracing::info!(user_id = %user.id, id = %record.id, "Goal created");
    Ok(Json(record))
}

/// PUT /api/goals/:id
///
/// Only the fields present in the body are changed.
#[utoipa::path(
    put,
    path = "/api/goals/{id}",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Goal id")),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Updated", body = Goal),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn update_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateGoalRequest>,
) -> Result<Json<Goal>, AppError> {
    let mut record = load_owned(state.storage.goals(), &id, user, NOT_FOUND)?;

    if let Some(description) = payload.description {
        record.description = description;
    }
    if let Some(status) = payload.status {
        record.status = status
            .parse()
            .map_err(|_| AppError::field("status", BAD_STATUS))?;
    }
    if let Some(raw) = payload.due_date {
        record.due_date = due_date(&raw)?;
    }
    if let Some(goal_type) = goal_type(payload.goal_type) {
        record.goal_type = goal_type;
    }
    record.updated_at = Utc::now();

    state
        .storage
        .goals()
        .replace(&record)
        .map_err(missing_as(NOT_FOUND))?;
    Ok(Json(record))
}

/// DELETE /api/goals/:id
#[utoipa::path(
    delete,
    path = "/api/goals/{id}",
    tag = "goals",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn delete_goal_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = load_owned(state.storage.goals(), &id, user, NOT_FOUND)?;
    state.storage.goals().remove(record.id)?;
    tracing::info!(user_id = %user.id, id = %record.id, "Goal removed");
    Ok(Json(MessageResponse::new("Goal removed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_reads_type_and_due_date() {
        let req: CreateGoalRequest = serde_json::from_str(
            r#"{"description": "Ship v1", "dueDate": "2025-09-30", "type": "yearly"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.goal_type.as_deref(), Some("yearly"));
        assert_eq!(due_date(&req.due_date).unwrap().to_rfc3339(), "2025-09-30T00:00:00+00:00");
    }

    #[test]
    fn test_create_request_requires_due_date() {
        let req: CreateGoalRequest = serde_json::from_str(r#"{"description": "Ship v1"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);
    }

    #[test]
    fn test_update_request_checks_only_present_fields() {
        assert!(UpdateGoalRequest::default().validate().is_ok());

        let req: UpdateGoalRequest = serde_json::from_str(r#"{"status": "done"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateGoalRequest = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_type_is_ignored() {
        assert_eq!(goal_type(Some("  ".into())), None);
        assert_eq!(goal_type(Some(" monthly ".into())), Some("monthly".into()));
    }
}
