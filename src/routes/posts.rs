//! Post routes
//!
//! - POST   /api/posts                              - create a post
//! - GET    /api/posts                              - all posts, newest first
//! - GET    /api/posts/{id}                         - post by id
//! - DELETE /api/posts/{id}                         - author-only delete
//! - PUT    /api/posts/like/{id}                    - like
//! - PUT    /api/posts/unlike/{id}                  - unlike
//! - POST   /api/posts/comment/{id}                 - comment on a post
//! - DELETE /api/posts/comment/{id}/{comment_id}    - author-only comment removal

use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::authorize;
use crate::db::schemas::PostDoc;
use crate::routes::{
    cors_preflight, error_response, json_response, method_not_allowed, not_found,
    parse_json_body, parse_object_id, BoxBody, MessageResponse,
};
use crate::server::AppState;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub user: String,
    pub name: String,
    pub avatar: String,
    pub text: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub user: String,
    pub name: String,
    pub avatar: String,
    pub text: String,
    pub date: String,
    pub likes: Vec<LikeResponse>,
    pub comments: Vec<CommentResponse>,
}

fn likes_of(post: &PostDoc) -> Vec<LikeResponse> {
    post.likes
        .iter()
        .map(|like| LikeResponse {
            user: like.user.to_hex(),
        })
        .collect()
}

fn comments_of(post: &PostDoc) -> Vec<CommentResponse> {
    post.comments
        .iter()
        .map(|c| CommentResponse {
            id: c.id.clone(),
            user: c.user.to_hex(),
            name: c.name.clone(),
            avatar: c.avatar.clone(),
            text: c.text.clone(),
            date: c.date.try_to_rfc3339_string().unwrap_or_default(),
        })
        .collect()
}

fn post_response(post: &PostDoc) -> PostResponse {
    PostResponse {
        id: post._id.map(|id| id.to_hex()).unwrap_or_default(),
        user: post.user.to_hex(),
        name: post.name.clone(),
        avatar: post.avatar.clone(),
        text: post.text.clone(),
        date: post.date.try_to_rfc3339_string().unwrap_or_default(),
        likes: likes_of(post),
        comments: comments_of(post),
    }
}

/// POST /api/posts
///
/// Create a post carrying a snapshot of the author's current name and
/// avatar; later profile edits do not update existing posts.
async fn handle_create(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;
    let body: CreatePostRequest = parse_json_body(req).await?;

    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let author = state.users.get(ctx.user_id).await?;
    let post = state
        .posts
        .create(PostDoc::new(
            ctx.user_id,
            author.name.clone(),
            author.avatar.clone(),
            body.text,
        ))
        .await?;

    Ok(json_response(StatusCode::CREATED, &post_response(&post)))
}

/// GET /api/posts
async fn handle_list(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    authorize(&req, &state.jwt)?;

    let posts = state.posts.find_all().await?;
    let responses: Vec<PostResponse> = posts.iter().map(post_response).collect();

    Ok(json_response(StatusCode::OK, &responses))
}

/// GET /api/posts/{id}
async fn handle_get(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    let post = state.posts.get(id).await?;

    Ok(json_response(StatusCode::OK, &post_response(&post)))
}

/// DELETE /api/posts/{id}
async fn handle_delete(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    state.posts.delete(id, ctx.user_id).await?;

    Ok(json_response(
        StatusCode::OK,
        &MessageResponse {
            message: "post removed".into(),
        },
    ))
}

/// PUT /api/posts/like/{id}
async fn handle_like(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    let post = state.posts.like(id, ctx.user_id).await?;

    Ok(json_response(StatusCode::OK, &likes_of(&post)))
}

/// PUT /api/posts/unlike/{id}
async fn handle_unlike(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    let post = state.posts.unlike(id, ctx.user_id).await?;

    Ok(json_response(StatusCode::OK, &likes_of(&post)))
}

/// POST /api/posts/comment/{id}
async fn handle_comment(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    let body: AddCommentRequest = parse_json_body(req).await?;

    if body.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let author = state.users.get(ctx.user_id).await?;
    let post = state
        .posts
        .add_comment(
            id,
            ctx.user_id,
            author.name.clone(),
            author.avatar.clone(),
            body.text,
        )
        .await?;

    Ok(json_response(StatusCode::OK, &comments_of(&post)))
}

/// DELETE /api/posts/comment/{id}/{comment_id}
async fn handle_remove_comment(
    req: Request<Incoming>,
    state: Arc<AppState>,
    raw_id: &str,
    comment_id: &str,
) -> Result<Response<BoxBody>> {
    let ctx = authorize(&req, &state.jwt)?;

    let id = parse_object_id(raw_id, "post")?;
    let post = state
        .posts
        .remove_comment(id, comment_id, ctx.user_id)
        .await?;

    Ok(json_response(StatusCode::OK, &comments_of(&post)))
}

/// Route post requests
pub async fn handle_post_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    let rest = match path.strip_prefix("/api/posts") {
        Some(rest) => rest.to_string(),
        None => return not_found(&path),
    };

    let result = match (&method, rest.as_str()) {
        (&Method::POST, "" | "/") => handle_create(req, state).await,
        (&Method::GET, "" | "/") => handle_list(req, state).await,

        (&Method::PUT, p) if p.starts_with("/like/") => {
            let raw = p.strip_prefix("/like/").unwrap_or("");
            handle_like(req, state, raw).await
        }
        (&Method::PUT, p) if p.starts_with("/unlike/") => {
            let raw = p.strip_prefix("/unlike/").unwrap_or("");
            handle_unlike(req, state, raw).await
        }
        (&Method::POST, p) if p.starts_with("/comment/") => {
            let raw = p.strip_prefix("/comment/").unwrap_or("");
            handle_comment(req, state, raw).await
        }
        (&Method::DELETE, p) if p.starts_with("/comment/") => {
            let rest = p.strip_prefix("/comment/").unwrap_or("");
            match rest.split_once('/') {
                Some((raw_id, comment_id)) if !comment_id.is_empty() => {
                    handle_remove_comment(req, state, raw_id, comment_id).await
                }
                _ => return not_found(&path),
            }
        }

        (&Method::GET, p) if p.starts_with('/') => {
            let raw = p.trim_start_matches('/');
            handle_get(req, state, raw).await
        }
        (&Method::DELETE, p) if p.starts_with('/') => {
            let raw = p.trim_start_matches('/');
            handle_delete(req, state, raw).await
        }

        (_, "" | "/") => return method_not_allowed(),

        _ => return not_found(&path),
    };

    result.unwrap_or_else(error_response)
}
