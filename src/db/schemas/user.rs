//! User document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::schemas::Metadata;
use crate::db::{IntoIndexes, MutMetadata};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Display name
    pub name: String,

    /// Unique email address (case-sensitive uniqueness key)
    pub email: String,

    /// Derived avatar URI, fixed at registration
    pub avatar: String,

    /// Argon2 password hash
    pub password_hash: String,
}

impl UserDoc {
    /// Create a new user document with a derived avatar
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let avatar = gravatar_url(&email);
        Self {
            _id: None,
            metadata: Metadata::new(),
            name,
            email,
            avatar,
            password_hash,
        }
    }
}

/// Derive a Gravatar-style avatar URI from an email address.
///
/// The address is trimmed and lowercased before hashing, per the
/// Gravatar addressing rules; the account email itself is stored as
/// given.
pub fn gravatar_url(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let digest = hasher.finalize();

    format!(
        "https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm",
        hex::encode(digest)
    )
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_is_derived_from_normalized_email() {
        let a = gravatar_url("Someone@Example.com ");
        let b = gravatar_url("someone@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
        assert!(a.ends_with("?s=200&r=pg&d=mm"));
    }

    #[test]
    fn different_emails_get_different_avatars() {
        assert_ne!(gravatar_url("a@example.com"), gravatar_url("b@example.com"));
    }
}
