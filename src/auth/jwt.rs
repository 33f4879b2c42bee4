//! JWT credential handling
//!
//! Credentials are HS256-signed tokens binding a user id to an expiry
//! instant. Verification is stateless: no session table, no server-side
//! revocation. The fixed expiry offset is the only cancellation
//! mechanism, so a leaked token stays valid until it lapses.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use bson::oid::ObjectId;

use crate::types::ApiError;

/// User reference embedded in the token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUser {
    /// Hex-encoded user document id
    pub id: String,
}

/// Payload stored in the signed token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT issuer and verifier
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new validator.
    ///
    /// Returns an error if the secret is empty or shorter than 32 bytes.
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, ApiError> {
        if secret.is_empty() {
            return Err(ApiError::Config("JWT_SECRET is required".into()));
        }

        if secret.len() < 32 {
            return Err(ApiError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issue a signed credential for an authenticated user.
    ///
    /// Stateless: nothing is persisted. A signing failure is terminal for
    /// the request that triggered it.
    pub fn issue(&self, user_id: &ObjectId) -> Result<String, ApiError> {
        self.issue_for_raw_id(&user_id.to_hex())
    }

    pub(crate) fn issue_for_raw_id(&self, id: &str) -> Result<String, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Internal(format!("system time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            user: TokenUser { id: id.to_string() },
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("failed to sign credential: {}", e)))
    }

    /// Verify a credential and return its claims.
    ///
    /// Every failure mode (bad signature, malformed token, expiry)
    /// collapses into `InvalidCredential`.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::InvalidCredential)
    }

    /// Seconds until a freshly issued credential lapses
    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let validator = test_validator();
        let user_id = ObjectId::new();

        let token = validator.issue(&user_id).unwrap();
        assert!(!token.is_empty());

        let claims = validator.verify(&token).unwrap();
        assert_eq!(claims.user.id, user_id.to_hex());
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn garbage_is_rejected() {
        let validator = test_validator();
        let err = validator.verify("not-even-a-token").unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = test_validator();
        let verifier = JwtValidator::new(
            "different-secret-that-is-at-least-32-chars".into(),
            3600,
        )
        .unwrap();

        let token = issuer.issue(&ObjectId::new()).unwrap();
        assert!(matches!(
            verifier.verify(&token).unwrap_err(),
            ApiError::InvalidCredential
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let validator = test_validator();
        let token = validator.issue(&ObjectId::new()).unwrap();

        // Flip one character inside the payload segment
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        assert_eq!(parts.len(), 3);
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        let mid = payload.len() / 2;
        payload[mid] = if payload[mid] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(
            validator.verify(&tampered).unwrap_err(),
            ApiError::InvalidCredential
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let validator = test_validator();

        // Back-date a token well past the default validation leeway
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            user: TokenUser {
                id: ObjectId::new().to_hex(),
            },
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(
                "test-secret-that-is-at-least-32-characters-long".as_bytes(),
            ),
        )
        .unwrap();

        assert!(matches!(
            validator.verify(&token).unwrap_err(),
            ApiError::InvalidCredential
        ));
    }

    #[test]
    fn secret_length_is_enforced() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new("".into(), 3600).is_err());
        assert!(
            JwtValidator::new("this-secret-is-at-least-32-chars-long".into(), 3600).is_ok()
        );
    }
}
