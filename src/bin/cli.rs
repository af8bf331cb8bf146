use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "goal-cli")]
#[command(about = "CLI for the goal_tracker API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, env = "GOAL_TRACKER_URL", default_value = "http://localhost:5000/api")]
    url: String,

    /// Where `login` stores the bearer token
    #[arg(long, env = "GOAL_TRACKER_TOKEN_FILE", default_value = ".goal_tracker_token")]
    token_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Show the logged-in profile
    Me,
    /// Core values
    #[command(subcommand)]
    Values(ValuesCommand),
    /// Mission and purpose
    #[command(subcommand)]
    Mission(MissionCommand),
    #[command(subcommand)]
    Visions(VisionsCommand),
    #[command(subcommand)]
    Goals(GoalsCommand),
    /// Daily tasks
    #[command(subcommand)]
    Tasks(TasksCommand),
}

#[derive(Subcommand)]
enum ValuesCommand {
    Get,
    Create {
        /// Repeat for each value
        #[arg(short, long = "value", required = true)]
        values: Vec<String>,
    },
    Update {
        #[arg(short, long)]
        id: String,
        #[arg(short, long = "value", required = true)]
        values: Vec<String>,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum MissionCommand {
    Get,
    Create(MissionArgs),
    Update {
        #[arg(short, long)]
        id: String,
        #[command(flatten)]
        fields: MissionArgs,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Args)]
struct MissionArgs {
    #[arg(short, long)]
    mission: String,
    #[arg(short, long)]
    purpose: String,
}

#[derive(Subcommand)]
enum VisionsCommand {
    List,
    Create {
        /// 10-year, 3-year or 1-year
        #[arg(short, long)]
        timeframe: String,
        #[arg(short, long)]
        description: String,
    },
    Update {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        description: String,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum GoalsCommand {
    List,
    Create {
        #[arg(short, long)]
        description: String,
        #[arg(long)]
        due_date: String,
        #[arg(short = 't', long = "type")]
        goal_type: Option<String>,
    },
    Update {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        description: Option<String>,
        /// "in progress" or "completed"
        #[arg(short, long)]
        status: Option<String>,
        #[arg(long)]
        due_date: Option<String>,
        #[arg(short = 't', long = "type")]
        goal_type: Option<String>,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum TasksCommand {
    List {
        /// YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
    },
    Create {
        #[arg(short, long)]
        description: String,
        #[arg(long)]
        date: String,
        #[arg(short = 'g', long)]
        linked_goal: Option<String>,
    },
    Update {
        #[arg(short, long)]
        id: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        completed: Option<bool>,
        #[arg(long)]
        date: Option<String>,
        /// Pass an empty string to unlink
        #[arg(short = 'g', long)]
        linked_goal: Option<String>,
    },
    Delete {
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

struct ApiClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    fn new(base: &str, token_file: &Path) -> Self {
        let token = fs::read_to_string(token_file)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            http: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<()> {
        let res = builder.send().await.context("request failed")?;
        let status = res.status();
        let text = res.text().await?;
        let body = serde_json::from_str::<Value>(&text)
            .and_then(|v| serde_json::to_string_pretty(&v))
            .unwrap_or(text);
        println!("{status}\n{body}");
        Ok(())
    }

    async fn get(&self, path: &str) -> anyhow::Result<()> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post(&self, path: &str, body: Value) -> anyhow::Result<()> {
        self.send(self.request(Method::POST, path).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> anyhow::Result<()> {
        self.send(self.request(Method::PUT, path).json(&body)).await
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

/// JSON object holding only the fields that were given.
fn partial(fields: &[(&str, Option<Value>)]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k.to_string(), v)))
        .collect();
    Value::Object(map)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.url, &cli.token_file);

    match cli.command {
        Commands::Register { name, email, password } => {
            api.post(
                "/auth/register",
                json!({ "name": name, "email": email, "password": password }),
            )
            .await?;
        }
        Commands::Login { email, password } => {
            let res = api
                .request(Method::POST, "/auth/login")
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await
                .context("request failed")?;
            let status = res.status();
            if status.is_success() {
                let body: TokenResponse = res.json().await?;
                fs::write(&cli.token_file, body.token).with_context(|| {
                    format!("failed to write {}", cli.token_file.display())
                })?;
                println!("Logged in. Token saved to {}", cli.token_file.display());
            } else {
                println!("Login failed ({status}): {}", res.text().await?);
            }
        }
        Commands::Logout => {
            let _ = fs::remove_file(&cli.token_file);
            println!("Logged out (token removed).");
        }
        Commands::Me => api.get("/auth/me").await?,

        Commands::Values(cmd) => match cmd {
            ValuesCommand::Get => api.get("/values").await?,
            ValuesCommand::Create { values } => api.post("/values", json!({ "values": values })).await?,
            ValuesCommand::Update { id, values } => {
                api.put(&format!("/values/{id}"), json!({ "values": values })).await?
            }
            ValuesCommand::Delete { id } => api.delete(&format!("/values/{id}")).await?,
        },

        Commands::Mission(cmd) => match cmd {
            MissionCommand::Get => api.get("/mission-purpose").await?,
            MissionCommand::Create(f) => {
                api.post(
                    "/mission-purpose",
                    json!({ "mission": f.mission, "purpose": f.purpose }),
                )
                .await?
            }
            MissionCommand::Update { id, fields: f } => {
                api.put(
                    &format!("/mission-purpose/{id}"),
                    json!({ "mission": f.mission, "purpose": f.purpose }),
                )
                .await?
            }
            MissionCommand::Delete { id } => api.delete(&format!("/mission-purpose/{id}")).await?,
        },

        Commands::Visions(cmd) => match cmd {
            VisionsCommand::List => api.get("/visions").await?,
            VisionsCommand::Create { timeframe, description } => {
                api.post(
                    "/visions",
                    json!({ "timeframe": timeframe, "description": description }),
                )
                .await?
            }
            VisionsCommand::Update { id, description } => {
                api.put(&format!("/visions/{id}"), json!({ "description": description }))
                    .await?
            }
            VisionsCommand::Delete { id } => api.delete(&format!("/visions/{id}")).await?,
        },

        Commands::Goals(cmd) => match cmd {
            GoalsCommand::List => api.get("/goals").await?,
            GoalsCommand::Create { description, due_date, goal_type } => {
                let body = partial(&[
                    ("description", Some(json!(description))),
                    ("dueDate", Some(json!(due_date))),
                    ("type", goal_type.map(Value::from)),
                ]);
                api.post("/goals", body).await?
            }
            GoalsCommand::Update { id, description, status, due_date, goal_type } => {
                let body = partial(&[
                    ("description", description.map(Value::from)),
                    ("status", status.map(Value::from)),
                    ("dueDate", due_date.map(Value::from)),
                    ("type", goal_type.map(Value::from)),
                ]);
                api.put(&format!("/goals/{id}"), body).await?
            }
            GoalsCommand::Delete { id } => api.delete(&format!("/goals/{id}")).await?,
        },

        Commands::Tasks(cmd) => match cmd {
            TasksCommand::List { date } => match date {
                Some(date) => api.get(&format!("/tasks?date={date}")).await?,
                None => api.get("/tasks").await?,
            },
            TasksCommand::Create { description, date, linked_goal } => {
                let body = partial(&[
                    ("description", Some(json!(description))),
                    ("date", Some(json!(date))),
                    ("linkedGoal", linked_goal.map(Value::from)),
                ]);
                api.post("/tasks", body).await?
            }
            TasksCommand::Update { id, description, completed, date, linked_goal } => {
                let body = partial(&[
                    ("description", description.map(Value::from)),
                    ("completed", completed.map(Value::from)),
                    ("date", date.map(Value::from)),
                    ("linkedGoal", linked_goal.map(Value::from)),
                ]);
                api.put(&format!("/tasks/{id}"), body).await?
            }
            TasksCommand::Delete { id } => api.delete(&format!("/tasks/{id}")).await?,
        },
    }

    Ok(())
}
