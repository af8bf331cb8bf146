use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{load_owned, AppState, CurrentUser, ValidatedJson};
use crate::error::{missing_as, AppError, MessageResponse, ValidationErrorResponse};
use crate::models::DailyTask;
use crate::validation::{day_bounds, parse_datetime, validate_iso_date, validate_not_blank};

const NOT_FOUND: &str = "Task not found";
const BAD_DATE: &str = "Date must be a valid date";
const BAD_LINKED_GOAL: &str = "Linked goal must be a valid id";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Only tasks on this UTC day (`YYYY-MM-DD`)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_iso_date", message = "Date is required"))]
    pub date: String,
    /// Goal id; empty or null means no link
    pub linked_goal: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[validate(custom(function = "validate_iso_date", message = "Date must be a valid date"))]
    pub date: Option<String>,
    /// Absent leaves the link alone; null or `""` clears it
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub linked_goal: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from a missing field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn task_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_datetime(raw).ok_or_else(|| AppError::field("date", BAD_DATE))
}

fn linked_goal(raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => id
            .parse()
            .map(Some)
            .map_err(|_| AppError::field("linkedGoal", BAD_LINKED_GOAL)),
    }
}

/// GET /api/tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(TaskQuery),
    responses(
        (status = 200, description = "The caller's tasks in date order", body = [DailyTask]),
        (status = 400, description = "Unparseable date filter", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<DailyTask>>, AppError> {
    let window = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => Some(day_bounds(task_date(raw)?)),
        None => None,
    };

    let mut tasks = state.storage.tasks().find_by_owner(user.id)?;
    if let Some((start, end)) = window {
        tasks.retain(|t| t.date >= start && t.date <= end);
    }
    tasks.sort_by_key(|t| t.date);
    Ok(Json(tasks))
}

/// POST /api/tasks
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 200, description = "Created", body = DailyTask),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateTaskRequest>,
) -> Result<Json<DailyTask>, AppError> {
    let now = Utc::now();
    let record = DailyTask {
        id: Uuid::new_v4(),
        user_id: user.id,
        date: task_date(&payload.date)?,
        linked_goal: linked_goal(payload.linked_goal.as_deref())?,
        description: payload.description,
        completed: false,
        created_at: now,
        updated_at: now,
    };
    state.storage.tasks().insert(&record)?;

    tracing::info!(user_id = %user.id, id = %record.id, "Task created");
    Ok(Json(record))
}

/// PUT /api/tasks/:id
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated", body = DailyTask),
        (status = 400, description = "Invalid input", body = ValidationErrorResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<DailyTask>, AppError> {
    let mut record = load_owned(state.storage.tasks(), &id, user, NOT_FOUND)?;

    if let Some(description) = payload.description {
        record.description = description;
    }
    if let Some(completed) = payload.completed {
        record.completed = completed;
    }
    if let Some(raw) = payload.date {
        record.date = task_date(&raw)?;
    }
    if let Some(link) = payload.linked_goal {
        record.linked_goal = linked_goal(link.as_deref())?;
    }
    record.updated_at = Utc::now();

    state
        .storage
        .tasks()
        .replace(&record)
        .map_err(missing_as(NOT_FOUND))?;
    Ok(Json(record))
}

/// DELETE /api/tasks/:id
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 401, description = "Not the owner or missing token", body = MessageResponse),
        (status = 404, description = "No such record", body = MessageResponse),
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let record = load_owned(state.storage.tasks(), &id, user, NOT_FOUND)?;
    state.storage.tasks().remove(record.id)?;
    tracing::info!(user_id = %user.id, id = %record.id, "Task removed");
    Ok(Json(MessageResponse::new("Task removed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_goal_tri_state() {
        let absent: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.linked_goal, None);

        let cleared: UpdateTaskRequest = serde_json::from_str(r#"{"linkedGoal": null}"#).unwrap();
        assert_eq!(cleared.linked_goal, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateTaskRequest =
            serde_json::from_str(&format!(r#"{{"linkedGoal": "{id}"}}"#)).unwrap();
        assert_eq!(set.linked_goal, Some(Some(id.to_string())));
    }

    #[test]
    fn test_linked_goal_parsing() {
        assert_eq!(linked_goal(None).unwrap(), None);
        assert_eq!(linked_goal(Some("")).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(linked_goal(Some(&id.to_string())).unwrap(), Some(id));
        assert!(linked_goal(Some("goal-1")).is_err());
    }

    #[test]
    fn test_create_request_rules() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"description": "Read"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"description": "Read", "date": "2025-06-15"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.linked_goal.is_none());
    }
}
