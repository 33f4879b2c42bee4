//! Post document schema
//!
//! A post owns two ordered sub-collections: likes (at most one per user)
//! and comments (newest-first). The author's name and avatar are copied
//! onto the post and each comment at write time; later profile edits do
//! not flow back into these snapshots.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::schemas::Metadata;
use crate::db::{IntoIndexes, MutMetadata};
use crate::types::ApiError;

/// Collection name for posts
pub const POST_COLLECTION: &str = "posts";

/// A like entry: one per distinct liking user
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Like {
    pub user: ObjectId,
}

/// A comment embedded in a post
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Comment {
    /// Generated at append time
    pub id: String,
    pub user: ObjectId,
    /// Author name snapshot taken when the comment was written
    pub name: String,
    /// Author avatar snapshot taken when the comment was written
    pub avatar: String,
    pub text: String,
    pub date: DateTime,
}

/// Post document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Authoring user
    pub user: ObjectId,

    /// Optimistic concurrency counter, bumped on every replace
    #[serde(default)]
    pub revision: i64,

    /// Author name snapshot taken at creation
    pub name: String,

    /// Author avatar snapshot taken at creation
    pub avatar: String,

    pub text: String,
    pub date: DateTime,

    #[serde(default)]
    pub likes: Vec<Like>,

    /// Newest-first by insertion
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl PostDoc {
    /// Create a new post carrying the author's current name and avatar
    pub fn new(author: ObjectId, name: String, avatar: String, text: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user: author,
            revision: 0,
            name,
            avatar,
            text,
            date: DateTime::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Record a like for `user`.
    ///
    /// At most one like per user per post: a second like is a `Conflict`
    /// and leaves the list unchanged.
    pub fn add_like(&mut self, user: ObjectId) -> Result<(), ApiError> {
        if self.likes.iter().any(|like| like.user == user) {
            return Err(ApiError::Conflict("post already liked".into()));
        }
        self.likes.insert(0, Like { user });
        Ok(())
    }

    /// Remove `user`'s like.
    ///
    /// Validates the opposite precondition of `add_like`: unliking a post
    /// the user never liked is a `Conflict`. Removal deletes exactly the
    /// matched entry, by the position of the match.
    pub fn remove_like(&mut self, user: ObjectId) -> Result<(), ApiError> {
        let position = self
            .likes
            .iter()
            .position(|like| like.user == user)
            .ok_or_else(|| ApiError::Conflict("post has not yet been liked".into()))?;
        self.likes.remove(position);
        Ok(())
    }

    /// Prepend a comment, assigning it a fresh id
    pub fn prepend_comment(
        &mut self,
        user: ObjectId,
        name: String,
        avatar: String,
        text: String,
    ) -> String {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user,
            name,
            avatar,
            text,
            date: DateTime::now(),
        };
        let id = comment.id.clone();
        self.comments.insert(0, comment);
        id
    }

    /// Remove the comment with the given id, on behalf of `requester`.
    ///
    /// The comment is resolved by its own id and removed at that exact
    /// position. Keying the removal on the requester's user id instead
    /// would delete the wrong entry whenever the requester has written
    /// other comments on the same post.
    pub fn remove_comment(&mut self, comment_id: &str, requester: ObjectId) -> Result<(), ApiError> {
        let position = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| ApiError::NotFound("comment".into()))?;

        if self.comments[position].user != requester {
            return Err(ApiError::Forbidden("comment belongs to another user".into()));
        }

        self.comments.remove(position);
        Ok(())
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user": 1 },
            Some(
                IndexOptions::builder()
                    .name("author_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> PostDoc {
        PostDoc::new(
            ObjectId::new(),
            "Jane Doe".into(),
            "https://www.gravatar.com/avatar/abc".into(),
            "hello".into(),
        )
    }

    #[test]
    fn second_like_by_the_same_user_is_a_conflict() {
        let mut post = post();
        let liker = ObjectId::new();

        post.add_like(liker).unwrap();
        assert_eq!(post.likes.len(), 1);

        let err = post.add_like(liker).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(post.likes.len(), 1);
    }

    #[test]
    fn unliking_without_a_like_is_a_conflict() {
        let mut post = post();
        post.add_like(ObjectId::new()).unwrap();

        let err = post.remove_like(ObjectId::new()).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(post.likes.len(), 1);
    }

    #[test]
    fn unlike_removes_only_the_matching_entry() {
        let mut post = post();
        let a = ObjectId::new();
        let b = ObjectId::new();
        post.add_like(a).unwrap();
        post.add_like(b).unwrap();

        post.remove_like(a).unwrap();

        assert_eq!(post.likes.len(), 1);
        assert_eq!(post.likes[0].user, b);
    }

    #[test]
    fn comments_read_back_newest_first() {
        let mut post = post();
        let user = ObjectId::new();
        for text in ["first", "second", "third"] {
            post.prepend_comment(user, "Jane".into(), "avatar".into(), text.into());
        }

        let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["third", "second", "first"]);
    }

    #[test]
    fn comment_removal_targets_the_id_not_the_author() {
        let mut post = post();
        let author = ObjectId::new();

        // Same author writes three comments; deleting the middle one must
        // not take out a sibling.
        post.prepend_comment(author, "Jane".into(), "avatar".into(), "oldest".into());
        let target =
            post.prepend_comment(author, "Jane".into(), "avatar".into(), "middle".into());
        post.prepend_comment(author, "Jane".into(), "avatar".into(), "newest".into());

        post.remove_comment(&target, author).unwrap();

        let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["newest", "oldest"]);
    }

    #[test]
    fn removing_a_missing_comment_is_not_found() {
        let mut post = post();
        let author = ObjectId::new();
        post.prepend_comment(author, "Jane".into(), "avatar".into(), "kept".into());

        let err = post.remove_comment("no-such-id", author).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(post.comments.len(), 1);
    }

    #[test]
    fn removing_someone_elses_comment_is_forbidden() {
        let mut post = post();
        let author = ObjectId::new();
        let id = post.prepend_comment(author, "Jane".into(), "avatar".into(), "kept".into());

        let err = post.remove_comment(&id, ObjectId::new()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(post.comments.len(), 1);
    }
}
