//! HTTP routes for Parlor

pub mod auth_routes;
pub mod health;
pub mod posts;
pub mod profiles;

pub use auth_routes::handle_auth_request;
pub use health::health_check;
pub use posts::handle_post_request;
pub use profiles::handle_profile_request;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::ApiError;

pub(crate) type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(full_body(json))
        .unwrap()
}

/// Render an error through the taxonomy's status mapping
pub(crate) fn error_response(err: ApiError) -> Response<BoxBody> {
    let status = err.status_code();
    if status.is_server_error() {
        warn!("request failed: {}", err);
    }
    json_response(
        status,
        &ErrorResponse {
            error: err.to_string(),
        },
    )
}

pub(crate) fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, x-auth-token")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub(crate) fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

pub(crate) async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, ApiError> {
    let body = req
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(ApiError::BadRequest("request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))
}

/// Parse a path segment as a document id.
///
/// A malformed id cannot name any stored document, so it reports the
/// same `NotFound` as a well-formed id that matches nothing.
pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<bson::oid::ObjectId, ApiError> {
    bson::oid::ObjectId::parse_str(raw).map_err(|_| ApiError::NotFound(what.into()))
}

pub(crate) fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("no route for {}", path),
        },
    )
}

pub(crate) fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "method not allowed".into(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_object_id_reads_as_not_found() {
        let err = parse_object_id("definitely-not-hex", "post").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn well_formed_object_id_parses() {
        let id = bson::oid::ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "post").unwrap(), id);
    }
}
