use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::Record;

/// Stored account. Never serialized to clients, see [`UserProfile`].
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }
}

/// Public view of a user, returned by `GET /api/auth/me`.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// JWT claims. `sub` is the user id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A user's guiding principles. One document per user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoreValues {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub values: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for CoreValues {
    const COLLECTION: &'static str = "core_values";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.user_id.to_string())
    }
}

/// Mission and purpose statements. One document per user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissionPurpose {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for MissionPurpose {
    const COLLECTION: &'static str = "mission_purposes";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.user_id.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
pub enum Timeframe {
    #[serde(rename = "10-year")]
    TenYear,
    #[serde(rename = "3-year")]
    ThreeYear,
    #[serde(rename = "1-year")]
    OneYear,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::TenYear, Timeframe::ThreeYear, Timeframe::OneYear];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::TenYear => "10-year",
            Timeframe::ThreeYear => "3-year",
            Timeframe::OneYear => "1-year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown timeframe: {s}"))
    }
}

/// Long-range vision for one timeframe. One document per user and timeframe.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vision {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub timeframe: Timeframe,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Vision {
    const COLLECTION: &'static str = "visions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}/{}", self.user_id, self.timeframe))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum GoalStatus {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::InProgress => "in progress",
            GoalStatus::Completed => "completed",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [GoalStatus::InProgress, GoalStatus::Completed]
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown goal status: {s}"))
    }
}

pub const DEFAULT_GOAL_TYPE: &str = "quarterly";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub goal_type: String,
    pub description: String,
    pub status: GoalStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Goal {
    const COLLECTION: &'static str = "goals";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub completed: bool,
    pub date: DateTime<Utc>,
    pub linked_goal: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for DailyTask {
    const COLLECTION: &'static str = "tasks";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}
