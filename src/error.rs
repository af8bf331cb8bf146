use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// One failed field of a request body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// `{"errors": [...]}` body of a 400 validation failure.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

/// `{"message": "..."}` body used for every other outcome.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn field(field: &str, message: &str) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::Duplicate { .. }) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::Storage(StorageError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            AppError::Storage(_) | AppError::Auth(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Turns a unique-key clash into a 400 with `message`; other storage errors
/// pass through.
pub fn duplicate_as(message: impl Into<String>) -> impl FnOnce(StorageError) -> AppError {
    move |err| match err {
        StorageError::Duplicate { .. } => AppError::BadRequest(message.into()),
        other => AppError::Storage(other),
    }
}

/// Turns a record that vanished under a write into a 404 with `message`;
/// other storage errors pass through.
pub fn missing_as(message: &str) -> impl FnOnce(StorageError) -> AppError + '_ {
    move |err| match err {
        StorageError::NotFound { .. } => AppError::NotFound(message.to_string()),
        other => AppError::Storage(other),
    }
}

/// Request fields are snake_case in Rust and camelCase on the wire.
fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = wire_name(&field);
                errs.iter().map(move |e| FieldError {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {field}")),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Top-level field named by a JSON data error, e.g. `completed` in
/// `...target type: completed: invalid type: string "yes", expected a boolean`.
fn rejected_field(detail: &str) -> Option<&str> {
    let rest = detail.strip_prefix(DATA_ERROR_PREFIX)?;
    let (path, _) = rest.split_once(": ")?;
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }
    path.split(['.', '[']).next().filter(|field| !field.is_empty())
}

/// Message for a body field that has the wrong JSON type.
fn wrong_type_message(field: &str) -> String {
    match field {
        "values" => "Values are required".to_string(),
        "completed" => "Completed must be a boolean".to_string(),
        "description" => "Description is required".to_string(),
        "date" => "Date must be a valid date".to_string(),
        "dueDate" => "Due date must be a valid date".to_string(),
        "status" => "Status must be either in progress or completed".to_string(),
        "timeframe" => "Timeframe must be 10-year, 3-year, or 1-year".to_string(),
        "linkedGoal" => "Linked goal must be a valid id".to_string(),
        "mission" => "Mission is required".to_string(),
        "purpose" => "Purpose is required".to_string(),
        "name" => "Name is required".to_string(),
        "email" => "Please include a valid email".to_string(),
        "password" => "Password is required".to_string(),
        other => format!("Invalid value for {other}"),
    }
}

/// Wrongly typed fields become field errors; unparseable bodies keep the
/// `{message}` form.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let detail = err.body_text();
                match rejected_field(&detail) {
                    Some(field) => AppError::field(field, &wrong_type_message(field)),
                    None => AppError::BadRequest(detail),
                }
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(errors) => {
                (status, Json(ValidationErrorResponse { errors })).into_response()
            }
            AppError::Storage(StorageError::Duplicate { collection, .. }) => (
                status,
                Json(MessageResponse::new(format!("Duplicate record in {collection}"))),
            )
                .into_response(),
            AppError::Storage(StorageError::NotFound { .. }) => {
                (status, Json(MessageResponse::new("Record not found"))).into_response()
            }
            AppError::BadRequest(message)
            | AppError::Unauthorized(message)
            | AppError::NotFound(message) => (status, Json(MessageResponse::new(message))).into_response(),
            err => {
                tracing::error!("Request failed: {}", err);
                (status, Json(MessageResponse::new("Server error"))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(email(message = "Please include a valid email"))]
        email: String,
    }

    #[test]
    fn test_validation_errors_are_flattened_and_sorted() {
        let sample = Sample {
            name: String::new(),
            email: "nope".to_string(),
        };
        let err = AppError::from(sample.validate().unwrap_err());
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError {
                    field: "email".to_string(),
                    message: "Please include a valid email".to_string(),
                },
                FieldError {
                    field: "name".to_string(),
                    message: "Name is required".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(wire_name("due_date"), "dueDate");
        assert_eq!(wire_name("linked_goal"), "linkedGoal");
        assert_eq!(wire_name("dueDate"), "dueDate");
        assert_eq!(wire_name("email"), "email");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::field("x", "y").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Unauthorized("Not authorized".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotFound("gone".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Storage(StorageError::CorruptKey("goals")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let duplicate = StorageError::Duplicate {
            collection: "visions",
            key: "k".into(),
        };
        assert_eq!(AppError::from(duplicate).status(), StatusCode::BAD_REQUEST);
        let missing = StorageError::NotFound { collection: "tasks" };
        assert_eq!(AppError::from(missing).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_as_keeps_other_errors() {
        let err = missing_as("Task not found")(StorageError::NotFound { collection: "tasks" });
        assert!(matches!(err, AppError::NotFound(m) if m == "Task not found"));

        let err = missing_as("unused")(StorageError::CorruptKey("tasks"));
        assert!(matches!(err, AppError::Storage(StorageError::CorruptKey(_))));
    }

    #[test]
    fn test_rejected_field_reads_the_path() {
        let detail = format!(
            "{DATA_ERROR_PREFIX}completed: invalid type: string \"yes\", expected a boolean at line 1 column 17"
        );
        assert_eq!(rejected_field(&detail), Some("completed"));

        let detail = format!(
            "{DATA_ERROR_PREFIX}values[0]: invalid type: integer `1`, expected a string at line 1 column 12"
        );
        assert_eq!(rejected_field(&detail), Some("values"));

        // No path when the whole body has the wrong shape
        let detail = format!(
            "{DATA_ERROR_PREFIX}invalid type: sequence, expected struct ValuesRequest at line 1 column 0"
        );
        assert_eq!(rejected_field(&detail), None);
        assert_eq!(rejected_field("Failed to parse the request body as JSON: EOF"), None);
    }

    #[test]
    fn test_wrong_type_messages() {
        assert_eq!(wrong_type_message("completed"), "Completed must be a boolean");
        assert_eq!(wrong_type_message("values"), "Values are required");
        assert_eq!(wrong_type_message("extra"), "Invalid value for extra");
    }

    #[test]
    fn test_duplicate_as_keeps_other_errors() {
        let err = duplicate_as("Core values already exist")(StorageError::Duplicate {
            collection: "core_values",
            key: "k".into(),
        });
        assert!(matches!(err, AppError::BadRequest(m) if m == "Core values already exist"));

        let err = duplicate_as("unused")(StorageError::CorruptKey("goals"));
        assert!(matches!(err, AppError::Storage(StorageError::CorruptKey(_))));
    }
}
