//! TaskNest API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use tasknest_api::AppState;
use tasknest_api::config::ApiConfig;
use tasknest_core::auth::store::PgCredentialStore;
use tasknest_core::auth::token::TokenCodec;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "tasknest_server", about = "TaskNest API server")]
struct Args {
    /// Address to bind the HTTP listener; overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,tasknest_api=debug,tasknest_core=debug".parse().unwrap()
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }

    // A missing or undersized secret must stop the process here, before
    // the listener binds.
    let codec = TokenCodec::new(
        &config.jwt_secret,
        config.access_ttl_ms,
        config.refresh_ttl_ms,
    )?;

    info!(max_connections = args.max_connections, "configuring connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    info!("running database migrations");
    tasknest_api::migrate(&pool).await?;

    let state = AppState {
        store: Arc::new(PgCredentialStore::new(pool)),
        codec,
        config: config.clone(),
    };

    let app = tasknest_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
