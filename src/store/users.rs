//! User store

use bson::{doc, oid::ObjectId};

use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{ApiError, Result};

/// Typed access to the users collection
#[derive(Clone)]
pub struct UserStore {
    coll: MongoCollection<UserDoc>,
}

impl UserStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            coll: client.collection::<UserDoc>(USER_COLLECTION).await?,
        })
    }

    /// Create a new account.
    ///
    /// Uniqueness is checked up front for the common case and enforced by
    /// the unique email index for the race: a duplicate-key write from a
    /// concurrent registration surfaces as the same `Conflict`.
    pub async fn register(&self, mut user: UserDoc) -> Result<UserDoc> {
        if self
            .coll
            .find_one(doc! { "email": &user.email })
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(
                "an account with this email already exists".into(),
            ));
        }

        let id = match self.coll.insert_one(user.clone()).await {
            Ok(id) => id,
            Err(ApiError::Conflict(_)) => {
                return Err(ApiError::Conflict(
                    "an account with this email already exists".into(),
                ))
            }
            Err(e) => return Err(e),
        };

        user._id = Some(id);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.coll.find_one(doc! { "email": email }).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        self.coll.find_one(doc! { "_id": id }).await
    }

    /// Load a user or report `NotFound`
    pub async fn get(&self, id: ObjectId) -> Result<UserDoc> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("user".into()))
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> Result<()> {
        self.coll.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}
