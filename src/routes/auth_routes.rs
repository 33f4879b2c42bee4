//! Registration and login routes
//!
//! - POST /api/users - register a new account and get a credential
//! - POST /api/auth  - authenticate and get a credential
//! - GET  /api/auth  - current user from the presented credential

use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{authorize, hash_password, verify_password};
use crate::db::schemas::UserDoc;
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, not_found,
    parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl From<&UserDoc> for UserResponse {
    fn from(user: &UserDoc) -> Self {
        Self {
            id: user._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// POST /api/users
///
/// Register a new account: enforce email uniqueness, hash the password,
/// derive the avatar, and hand back a credential.
async fn handle_register(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: RegisterRequest = parse_json_body(req).await?;

    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "password must be at least 6 characters".into(),
        ));
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .users
        .register(UserDoc::new(body.name, body.email, password_hash))
        .await?;

    let id = user
        ._id
        .ok_or_else(|| ApiError::Internal("registered user has no id".into()))?;
    let token = state.jwt.issue(&id)?;

    info!("registered new user: {}", user.email);

    Ok(json_response(StatusCode::CREATED, &AuthResponse { token }))
}

/// POST /api/auth
///
/// Authenticate with email and password. A missing user and a wrong
/// password report the same generic failure so the response never
/// confirms whether the email is registered.
async fn handle_login(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: LoginRequest = parse_json_body(req).await?;

    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".into(),
        ));
    }

    let user = match state.users.find_by_email(&body.email).await? {
        Some(u) => u,
        None => {
            warn!("login failed - unknown email");
            return Err(ApiError::InvalidCredential);
        }
    };

    if !verify_password(&body.password, &user.password_hash)? {
        warn!("login failed - bad password: {}", user.email);
        return Err(ApiError::InvalidCredential);
    }

    let id = user
        ._id
        .ok_or_else(|| ApiError::Internal("stored user has no id".into()))?;
    let token = state.jwt.issue(&id)?;

    info!("login successful: {}", user.email);

    Ok(json_response(StatusCode::OK, &AuthResponse { token }))
}

/// GET /api/auth
///
/// Return the authenticated user, password hash omitted.
async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let user = state.users.get(ctx.user_id).await?;

    Ok(json_response(StatusCode::OK, &UserResponse::from(&user)))
}

/// Route registration/login requests
pub async fn handle_auth_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let result = match (&method, path.as_str()) {
        (&Method::POST, "/api/users") => handle_register(req, state).await,
        (&Method::POST, "/api/auth") => handle_login(req, state).await,
        (&Method::GET, "/api/auth") => handle_me(req, state).await,

        (_, "/api/users") | (_, "/api/auth") => return method_not_allowed(),

        _ => return not_found(&path),
    };

    result.unwrap_or_else(error_response)
}
