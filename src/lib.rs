//! goal_tracker: personal goal tracking backend.
//!
//! Users register and log in with bcrypt-hashed passwords and HS256 bearer
//! tokens, then manage their core values, mission and purpose, visions,
//! goals and daily tasks. Records live in Sled collections and are served
//! as JSON by an Axum router under `/api`.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
// REST API module: Axum handlers, auth middleware and the OpenAPI document
pub mod rest;
pub mod storage;
pub mod telemetry;
pub mod validation;
