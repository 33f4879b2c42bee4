//! Profile routes
//!
//! - GET    /api/profile/me                - caller's profile
//! - POST   /api/profile                   - create or update (partial merge)
//! - GET    /api/profile                   - all profiles
//! - GET    /api/profile/user/{user_id}    - profile by owner
//! - DELETE /api/profile                   - cascading account delete
//! - PUT    /api/profile/experience        - add an experience entry
//! - DELETE /api/profile/experience/{id}   - remove an experience entry
//! - PUT    /api/profile/education         - add an education entry
//! - DELETE /api/profile/education/{id}    - remove an education entry

use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::authorize;
use crate::db::schemas::{
    EducationEntry, ExperienceEntry, ProfileDoc, ProfileFields, SocialLinks,
};
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, not_found,
    parse_json_body, parse_object_id, BoxBody, MessageResponse,
};
use crate::server::AppState;
use crate::store;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExperienceRequest {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEducationRequest {
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Owner name/avatar attached to profile reads
#[derive(Debug, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub user: OwnerSummary,
    pub handle: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    pub skills: Vec<String>,
    pub social: SocialLinks,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
}

/// Attach the owner's current name and avatar to a profile read.
///
/// Unlike post snapshots, profile reads join the owner live: the profile
/// never stores its own copy of these fields.
async fn profile_response(state: &AppState, profile: ProfileDoc) -> Result<ProfileResponse> {
    let owner = state.users.find_by_id(profile.user).await?;

    Ok(ProfileResponse {
        id: profile._id.map(|id| id.to_hex()).unwrap_or_default(),
        user: OwnerSummary {
            id: profile.user.to_hex(),
            name: owner.as_ref().map(|u| u.name.clone()),
            avatar: owner.as_ref().map(|u| u.avatar.clone()),
        },
        handle: profile.handle,
        status: profile.status,
        company: profile.company,
        website: profile.website,
        location: profile.location,
        bio: profile.bio,
        github_username: profile.github_username,
        skills: profile.skills,
        social: profile.social,
        experience: profile.experience,
        education: profile.education,
    })
}

/// GET /api/profile/me
async fn handle_me(req: Request<Incoming>, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let profile = state.profiles.get_by_owner(ctx.user_id).await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// POST /api/profile
///
/// Create or update the caller's profile in one atomic upsert against
/// the unique owner index. Supplied fields are merged; absent fields
/// stay as they are.
async fn handle_upsert(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let fields: ProfileFields = parse_json_body(req).await?;

    for (key, value) in [
        ("handle", &fields.handle),
        ("status", &fields.status),
        ("skills", &fields.skills),
    ] {
        if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
            return Err(ApiError::BadRequest(format!("{} is required", key)));
        }
    }

    let profile = state.profiles.upsert(ctx.user_id, &fields).await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// GET /api/profile
async fn handle_list(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let profiles = state.profiles.find_all().await?;

    let mut responses = Vec::with_capacity(profiles.len());
    for profile in profiles {
        responses.push(profile_response(&state, profile).await?);
    }

    Ok(json_response(StatusCode::OK, &responses))
}

/// GET /api/profile/user/{user_id}
async fn handle_by_user(state: Arc<AppState>, raw_id: &str) -> Result<Response<BoxBody>> {
    let owner = parse_object_id(raw_id, "profile")?;
    let profile = state.profiles.get_by_owner(owner).await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// DELETE /api/profile
///
/// Cascading account delete: the caller's posts, then profile, then the
/// user record itself.
async fn handle_delete_account(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    store::delete_account(&state.users, &state.profiles, &state.posts, ctx.user_id).await?;

    info!("deleted account {}", ctx.user_id);

    Ok(json_response(
        StatusCode::OK,
        &MessageResponse {
            message: "user deleted".into(),
        },
    ))
}

/// PUT /api/profile/experience
async fn handle_add_experience(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let body: AddExperienceRequest = parse_json_body(req).await?;

    for (key, value) in [
        ("title", &body.title),
        ("company", &body.company),
        ("from", &body.from),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{} is required", key)));
        }
    }

    let entry = ExperienceEntry {
        id: String::new(),
        title: body.title,
        company: body.company,
        location: body.location,
        from: body.from,
        to: body.to,
        current: body.current,
        description: body.description,
    };

    let profile = state.profiles.add_experience(ctx.user_id, entry).await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// DELETE /api/profile/experience/{id}
async fn handle_remove_experience(
    req: Request<Incoming>,
    state: Arc<AppState>,
    entry_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let profile = state
        .profiles
        .remove_experience(ctx.user_id, entry_id)
        .await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// PUT /api/profile/education
async fn handle_add_education(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let body: AddEducationRequest = parse_json_body(req).await?;

    for (key, value) in [
        ("school", &body.school),
        ("degree", &body.degree),
        ("fieldOfStudy", &body.field_of_study),
        ("from", &body.from),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{} is required", key)));
        }
    }

    let entry = EducationEntry {
        id: String::new(),
        school: body.school,
        degree: body.degree,
        field_of_study: body.field_of_study,
        from: body.from,
        to: body.to,
        current: body.current,
        description: body.description,
    };

    let profile = state.profiles.add_education(ctx.user_id, entry).await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// DELETE /api/profile/education/{id}
async fn handle_remove_education(
    req: Request<Incoming>,
    state: Arc<AppState>,
    entry_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let profile = state
        .profiles
        .remove_education(ctx.user_id, entry_id)
        .await?;
    let response = profile_response(&state, profile).await?;

    Ok(json_response(StatusCode::OK, &response))
}

/// Route profile requests
pub async fn handle_profile_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let result = match (&method, path.as_str()) {
        (&Method::GET, "/api/profile/me") => handle_me(req, state).await,
        (&Method::POST, "/api/profile") => handle_upsert(req, state).await,
        (&Method::GET, "/api/profile") => handle_list(state).await,
        (&Method::DELETE, "/api/profile") => handle_delete_account(req, state).await,
        (&Method::PUT, "/api/profile/experience") => handle_add_experience(req, state).await,
        (&Method::PUT, "/api/profile/education") => handle_add_education(req, state).await,

        (&Method::GET, p) if p.starts_with("/api/profile/user/") => {
            let raw = p.strip_prefix("/api/profile/user/").unwrap_or("");
            handle_by_user(state, raw).await
        }
        (&Method::DELETE, p) if p.starts_with("/api/profile/experience/") => {
            let raw = p.strip_prefix("/api/profile/experience/").unwrap_or("");
            handle_remove_experience(req, state, raw).await
        }
        (&Method::DELETE, p) if p.starts_with("/api/profile/education/") => {
            let raw = p.strip_prefix("/api/profile/education/").unwrap_or("");
            handle_remove_education(req, state, raw).await
        }

        (_, "/api/profile")
        | (_, "/api/profile/me")
        | (_, "/api/profile/experience")
        | (_, "/api/profile/education") => return method_not_allowed(),

        _ => return not_found(&path),
    };

    result.unwrap_or_else(error_response)
}
