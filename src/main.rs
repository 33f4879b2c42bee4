//! Parlor - profile and post API service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parlor::{config::Args, db::MongoClient, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("parlor={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("==============================");
    info!("  Parlor - profile & post API");
    info!("==============================");
    info!("Listen: {}", args.listen);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Token expiry: {}s", args.jwt_expiry_seconds);
    info!("==============================");

    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::new(args, &mongo).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    server::run(state).await?;

    Ok(())
}
