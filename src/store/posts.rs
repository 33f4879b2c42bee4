//! Post store

use bson::{doc, oid::ObjectId};

use crate::db::schemas::{PostDoc, POST_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{ApiError, Result};

/// Typed access to the posts collection
#[derive(Clone)]
pub struct PostStore {
    coll: MongoCollection<PostDoc>,
}

impl PostStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            coll: client.collection::<PostDoc>(POST_COLLECTION).await?,
        })
    }

    pub async fn create(&self, mut post: PostDoc) -> Result<PostDoc> {
        let id = self.coll.insert_one(post.clone()).await?;
        post._id = Some(id);
        Ok(post)
    }

    /// All posts, newest first
    pub async fn find_all(&self) -> Result<Vec<PostDoc>> {
        self.coll.find_many(doc! {}, Some(doc! { "date": -1 })).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<PostDoc>> {
        self.coll.find_one(doc! { "_id": id }).await
    }

    /// Load a post or report `NotFound`
    pub async fn get(&self, id: ObjectId) -> Result<PostDoc> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("post".into()))
    }

    /// Delete a post on behalf of `requester`.
    ///
    /// Only the author may delete; anyone else gets `Forbidden`, distinct
    /// from the post simply not existing.
    pub async fn delete(&self, id: ObjectId, requester: ObjectId) -> Result<()> {
        let post = self.get(id).await?;

        if post.user != requester {
            return Err(ApiError::Forbidden("post belongs to another user".into()));
        }

        self.coll.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }

    pub async fn like(&self, id: ObjectId, user: ObjectId) -> Result<PostDoc> {
        super::mutate(&self.coll, doc! { "_id": id }, "post", move |p| {
            p.add_like(user)
        })
        .await
    }

    pub async fn unlike(&self, id: ObjectId, user: ObjectId) -> Result<PostDoc> {
        super::mutate(&self.coll, doc! { "_id": id }, "post", move |p| {
            p.remove_like(user)
        })
        .await
    }

    pub async fn add_comment(
        &self,
        id: ObjectId,
        user: ObjectId,
        name: String,
        avatar: String,
        text: String,
    ) -> Result<PostDoc> {
        super::mutate(&self.coll, doc! { "_id": id }, "post", move |p| {
            p.prepend_comment(user, name.clone(), avatar.clone(), text.clone());
            Ok(())
        })
        .await
    }

    pub async fn remove_comment(
        &self,
        id: ObjectId,
        comment_id: &str,
        requester: ObjectId,
    ) -> Result<PostDoc> {
        super::mutate(&self.coll, doc! { "_id": id }, "post", move |p| {
            p.remove_comment(comment_id, requester)
        })
        .await
    }

    /// Remove every post authored by `author` (cascade step)
    pub async fn delete_by_author(&self, author: ObjectId) -> Result<u64> {
        let result = self.coll.delete_many(doc! { "user": author }).await?;
        Ok(result.deleted_count)
    }
}
