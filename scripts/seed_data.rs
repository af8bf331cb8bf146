//! Seed script for goal_tracker
//!
//! Creates a demo account with one record of each kind:
//! - user demo@example.com / password123
//! - core values, mission and purpose, a vision per timeframe
//! - a goal and a task for today linked to it
//!
//! Records that already exist are left alone, so running it twice is safe.
//! Run: cargo run --bin seed_data [-- --data-dir goal_tracker_data]

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

use goal_tracker::auth::hash_password;
use goal_tracker::config::LogFormat;
use goal_tracker::models::{
    CoreValues, DailyTask, Goal, GoalStatus, MissionPurpose, Timeframe, User, Vision,
    DEFAULT_GOAL_TYPE,
};
use goal_tracker::storage::{Storage, StorageError};
use goal_tracker::telemetry;

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "password123";

#[derive(Parser)]
#[command(name = "seed_data", about = "Populate goal_tracker with a demo account")]
struct Args {
    #[arg(long, env = "DATA_DIR", default_value = "goal_tracker_data")]
    data_dir: PathBuf,

    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    bcrypt_cost: u32,
}

/// Insert unless the unique slot is already taken.
fn insert_once(kind: &str, result: Result<(), StorageError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => tracing::info!("Created {}", kind),
        Err(StorageError::Duplicate { .. }) => tracing::info!("{} already present, skipped", kind),
        Err(e) => return Err(e).with_context(|| format!("failed to create {kind}")),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _guard = telemetry::init(LogFormat::Pretty, None);

    let storage = Storage::open(&args.data_dir)
        .with_context(|| format!("failed to open data dir {}", args.data_dir.display()))?;
    let now = Utc::now();

    let user = match storage.users().find_by_unique(DEMO_EMAIL)? {
        Some(user) => {
            tracing::info!(user_id = %user.id, "Demo user already present");
            user
        }
        None => {
            let user = User {
                id: Uuid::new_v4(),
                name: "Demo User".to_string(),
                email: DEMO_EMAIL.to_string(),
                password_hash: hash_password(DEMO_PASSWORD, args.bcrypt_cost)?,
                created_at: now,
                updated_at: now,
            };
            storage.users().insert(&user)?;
            tracing::info!(user_id = %user.id, "Created demo user");
            user
        }
    };

    insert_once(
        "core values",
        storage.core_values().insert(&CoreValues {
            id: Uuid::new_v4(),
            user_id: user.id,
            values: vec![
                "Integrity".to_string(),
                "Curiosity".to_string(),
                "Health".to_string(),
            ],
            created_at: now,
            updated_at: now,
        }),
    )?;

    insert_once(
        "mission and purpose",
        storage.mission_purposes().insert(&MissionPurpose {
            id: Uuid::new_v4(),
            user_id: user.id,
            mission: "Build useful things and keep learning".to_string(),
            purpose: "Leave the people around me better off".to_string(),
            created_at: now,
            updated_at: now,
        }),
    )?;

    for (timeframe, description) in Timeframe::ALL.into_iter().zip([
        "Run my own small studio",
        "Lead a product team",
        "Ship one side project end to end",
    ]) {
        insert_once(
            &format!("{timeframe} vision"),
            storage.visions().insert(&Vision {
                id: Uuid::new_v4(),
                user_id: user.id,
                timeframe,
                description: description.to_string(),
                created_at: now,
                updated_at: now,
            }),
        )?;
    }

    // Goals and tasks have no unique key; only seed them into an empty account
    if storage.goals().find_by_owner(user.id)?.is_empty() {
        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: user.id,
            goal_type: DEFAULT_GOAL_TYPE.to_string(),
            description: "Publish the side project beta".to_string(),
            status: GoalStatus::InProgress,
            due_date: now + Duration::days(90),
            created_at: now,
            updated_at: now,
        };
        storage.goals().insert(&goal)?;
        tracing::info!(id = %goal.id, "Created goal");

        if storage.tasks().find_by_owner(user.id)?.is_empty() {
            let task = DailyTask {
                id: Uuid::new_v4(),
                user_id: user.id,
                description: "Write the landing page copy".to_string(),
                completed: false,
                date: now,
                linked_goal: Some(goal.id),
                created_at: now,
                updated_at: now,
            };
            storage.tasks().insert(&task)?;
            tracing::info!(id = %task.id, "Created task");
        }
    } else {
        tracing::info!("Goals already present, skipped goals and tasks");
    }

    storage.flush().await?;
    println!("✅ Seeded {} (password: {})", DEMO_EMAIL, DEMO_PASSWORD);
    Ok(())
}
