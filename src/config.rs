//! Configuration for Parlor
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Parlor - profile and post API service
#[derive(Parser, Debug, Clone)]
#[command(name = "parlor")]
#[command(about = "Profile and post API service backed by MongoDB")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "parlor")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration before serving
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None => Err("JWT_SECRET is required".into()),
            Some(s) if s.len() < 32 => {
                Err("JWT_SECRET must be at least 32 characters".into())
            }
            Some(_) => Ok(()),
        }
    }
}
