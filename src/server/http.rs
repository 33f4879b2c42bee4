//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection is
//! served on its own task; requests share nothing but the application
//! state, and the document store is the sole serialization point.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::routes::BoxBody;
use crate::store::{PostStore, ProfileStore, UserStore};
use crate::types::ApiError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub jwt: JwtValidator,
    pub users: UserStore,
    pub profiles: ProfileStore,
    pub posts: PostStore,
}

impl AppState {
    /// Build state from validated configuration and a live store
    /// connection; collection indexes are applied here, once.
    pub async fn new(args: Args, mongo: &MongoClient) -> Result<Self, ApiError> {
        let secret = args
            .jwt_secret
            .clone()
            .ok_or_else(|| ApiError::Config("JWT_SECRET is required".into()))?;
        let jwt = JwtValidator::new(secret, args.jwt_expiry_seconds)?;

        let users = UserStore::new(mongo).await?;
        let profiles = ProfileStore::new(mongo).await?;
        let posts = PostStore::new(mongo).await?;

        Ok(Self {
            args,
            jwt,
            users,
            profiles,
            posts,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ApiError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Parlor listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if path.starts_with("/api/users") || path.starts_with("/api/auth") {
        return Ok(routes::handle_auth_request(req, state).await);
    }
    if path.starts_with("/api/profile") {
        return Ok(routes::handle_profile_request(req, state).await);
    }
    if path.starts_with("/api/posts") {
        return Ok(routes::handle_post_request(req, state).await);
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),
        (Method::OPTIONS, _) => routes::cors_preflight(),
        _ => routes::not_found(&path),
    };

    Ok(response)
}
