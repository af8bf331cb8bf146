//! REST API layer (Axum).
//!
//! Every route lives under `/api`. Register and login are public; everything
//! else sits behind [`auth_middleware`], which attaches a [`CurrentUser`] to
//! the request. Handlers then check record ownership themselves.

pub mod auth;
pub mod docs;
pub mod goals;
pub mod mission_purpose;
pub mod tasks;
pub mod values;
pub mod visions;

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Authenticator;
use crate::error::AppError;
use crate::storage::{Collection, Record, Storage};

/// Shared app state for REST handlers (Arc-wrapped for concurrency)
pub struct AppState {
    pub storage: Storage,
    pub auth: Authenticator,
}

/// Identity of the caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// JSON body extractor that also runs the `validator` rules, turning both
/// parse and validation failures into 400 responses.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

    let user_id = state.auth.validate_token(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::Unauthorized("Token is not valid".to_string())
    })?;

    req.extensions_mut().insert(CurrentUser { id: user_id });
    Ok(next.run(req).await)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Build the application router over the given storage.
pub fn create_router(storage: Storage, auth: Authenticator) -> Router {
    let state = Arc::new(AppState { storage, auth });

    let protected = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/values",
            get(values::get_values_handler).post(values::create_values_handler),
        )
        .route(
            "/values/:id",
            put(values::update_values_handler).delete(values::delete_values_handler),
        )
        .route(
            "/mission-purpose",
            get(mission_purpose::get_mission_purpose_handler)
                .post(mission_purpose::create_mission_purpose_handler),
        )
        .route(
            "/mission-purpose/:id",
            put(mission_purpose::update_mission_purpose_handler)
                .delete(mission_purpose::delete_mission_purpose_handler),
        )
        .route(
            "/visions",
            get(visions::list_visions_handler).post(visions::create_vision_handler),
        )
        .route(
            "/visions/:id",
            put(visions::update_vision_handler).delete(visions::delete_vision_handler),
        )
        .route(
            "/goals",
            get(goals::list_goals_handler).post(goals::create_goal_handler),
        )
        .route(
            "/goals/:id",
            put(goals::update_goal_handler).delete(goals::delete_goal_handler),
        )
        .route(
            "/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route(
            "/tasks/:id",
            put(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .merge(protected)
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Load a record by its raw path id and check that `user` owns it.
///
/// A missing record (or an id that is not a UUID) is a 404 with
/// `not_found`; someone else's record is a 401.
pub(crate) fn load_owned<T: Record>(
    collection: &Collection<T>,
    raw_id: &str,
    user: CurrentUser,
    not_found: &str,
) -> Result<T, AppError> {
    let record = match raw_id.parse::<Uuid>() {
        Ok(id) => collection.get(id)?,
        Err(_) => None,
    };
    let record = record.ok_or_else(|| AppError::NotFound(not_found.to_string()))?;

    if record.owner_id() != user.id {
        tracing::warn!(
            collection = T::COLLECTION,
            record_id = %record.id(),
            user_id = %user.id,
            "Ownership check failed"
        );
        return Err(AppError::Unauthorized("Not authorized".to_string()));
    }
    Ok(record)
}
