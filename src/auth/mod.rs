//! Authentication for Parlor
//!
//! Provides:
//! - JWT credential issuance and verification
//! - Password hashing with Argon2
//! - The request guard applied to every protected route

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtValidator, TokenUser};
pub use password::{hash_password, verify_password};

use bson::oid::ObjectId;
use hyper::Request;

use crate::types::ApiError;

/// Header carrying the credential on protected requests
pub const AUTH_HEADER: &str = "x-auth-token";

/// Identity attached to a request once its credential has been verified
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: ObjectId,
}

/// Verify the credential on an incoming request.
///
/// A missing `x-auth-token` header fails with `MissingCredential`; any
/// verification failure (bad signature, malformed payload, expiry, or an
/// id that does not parse) fails with `InvalidCredential`. Both render as
/// 401. Verification reads the request only; it never mutates state.
pub fn authorize<B>(req: &Request<B>, jwt: &JwtValidator) -> Result<AuthContext, ApiError> {
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingCredential)?;

    let claims = jwt.verify(token)?;

    let user_id =
        ObjectId::parse_str(&claims.user.id).map_err(|_| ApiError::InvalidCredential)?;

    Ok(AuthContext { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    fn request_with_header(value: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/api/posts");
        if let Some(v) = value {
            builder = builder.header(AUTH_HEADER, v);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn missing_header_is_missing_credential() {
        let err = authorize(&request_with_header(None), &validator()).unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential));
    }

    #[test]
    fn empty_header_is_missing_credential() {
        let err = authorize(&request_with_header(Some("  ")), &validator()).unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential));
    }

    #[test]
    fn garbage_token_is_invalid_credential() {
        let err =
            authorize(&request_with_header(Some("not-a-token")), &validator()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential));
    }

    #[test]
    fn valid_token_yields_the_embedded_identity() {
        let jwt = validator();
        let user_id = ObjectId::new();
        let token = jwt.issue(&user_id).unwrap();

        let ctx = authorize(&request_with_header(Some(&token)), &jwt).unwrap();
        assert_eq!(ctx.user_id, user_id);
    }

    #[test]
    fn token_with_unparseable_id_is_invalid_credential() {
        let jwt = validator();
        let token = jwt.issue_for_raw_id("not-an-object-id").unwrap();

        let err = authorize(&request_with_header(Some(&token)), &jwt).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential));
    }
}
