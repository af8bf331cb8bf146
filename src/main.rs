//! goal_tracker server
//!
//! Opens the Sled store and serves the REST API.
//!
//! Usage:
//!   JWT_SECRET=change-me cargo run --bin goal_tracker
//!   cargo run --bin seed_data      # optional demo account
//!   # then browse http://localhost:5000/swagger-ui

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use goal_tracker::auth::Authenticator;
use goal_tracker::config::Config;
use goal_tracker::rest::create_router;
use goal_tracker::storage::Storage;
use goal_tracker::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply
    dotenvy::dotenv().ok();
    let config = Config::parse();
    let _log_guard = telemetry::init(config.log_format, config.log_dir.as_deref());

    let storage = Storage::open(&config.data_dir)
        .with_context(|| format!("failed to open data dir {}", config.data_dir.display()))?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        users = storage.users().len(),
        "Storage opened"
    );

    let auth = Authenticator::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl(),
        config.bcrypt_cost,
    );
    let app = create_router(storage.clone(), auth);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "goal_tracker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let flushed = storage.flush().await.context("failed to flush storage")?;
    tracing::info!(bytes = flushed, "Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
