use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub const MAX_TOKEN_TTL_HOURS: u64 = 10 * 365 * 24;

/// Server settings. Every flag can also come from the environment (or a
/// `.env` file loaded before parsing).
#[derive(Debug, Clone, Parser)]
#[command(name = "goal_tracker", about = "Goal tracking REST API server", version)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory of the Sled database
    #[arg(long, env = "DATA_DIR", default_value = "goal_tracker_data")]
    pub data_dir: PathBuf,

    /// HS256 secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Bearer token lifetime, at most ten years
    #[arg(
        long,
        env = "TOKEN_TTL_HOURS",
        default_value_t = 168,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_TTL_HOURS)
    )]
    pub token_ttl_hours: u64,

    /// bcrypt work factor (4 to 31)
    #[arg(
        long,
        env = "BCRYPT_COST",
        default_value_t = bcrypt::DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31)
    )]
    pub bcrypt_cost: u32,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Write logs to a daily rolling file in this directory instead of stdout
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(60 * 60))
    }
}
