//! OpenAPI document served at `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::{auth, goals, mission_purpose, tasks, values, visions};
use crate::error::{FieldError, MessageResponse, ValidationErrorResponse};
use crate::models::{CoreValues, DailyTask, Goal, GoalStatus, MissionPurpose, Timeframe, UserProfile, Vision};

#[derive(OpenApi)]
#[openapi(
    info(title = "goal_tracker", description = "Personal goal tracking API"),
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        values::get_values_handler,
        values::create_values_handler,
        values::update_values_handler,
        values::delete_values_handler,
        mission_purpose::get_mission_purpose_handler,
        mission_purpose::create_mission_purpose_handler,
        mission_purpose::update_mission_purpose_handler,
        mission_purpose::delete_mission_purpose_handler,
        visions::list_visions_handler,
        visions::create_vision_handler,
        visions::update_vision_handler,
        visions::delete_vision_handler,
        goals::list_goals_handler,
        goals::create_goal_handler,
        goals::update_goal_handler,
        goals::delete_goal_handler,
        tasks::list_tasks_handler,
        tasks::create_task_handler,
        tasks::update_task_handler,
        tasks::delete_task_handler,
    ),
    components(schemas(
        UserProfile,
        CoreValues,
        MissionPurpose,
        Timeframe,
        Vision,
        GoalStatus,
        Goal,
        DailyTask,
        FieldError,
        ValidationErrorResponse,
        MessageResponse,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::TokenResponse,
        values::ValuesRequest,
        mission_purpose::MissionPurposeRequest,
        visions::CreateVisionRequest,
        visions::UpdateVisionRequest,
        goals::CreateGoalRequest,
        goals::UpdateGoalRequest,
        tasks::CreateTaskRequest,
        tasks::UpdateTaskRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current profile"),
        (name = "values", description = "Core values"),
        (name = "mission-purpose", description = "Mission and purpose statements"),
        (name = "visions", description = "10, 3 and 1 year visions"),
        (name = "goals", description = "Goals with due dates"),
        (name = "tasks", description = "Daily tasks"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
