//! Profile store

use bson::{doc, oid::ObjectId, DateTime};

use crate::db::schemas::{
    EducationEntry, ExperienceEntry, ProfileDoc, ProfileFields, PROFILE_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{ApiError, Result};

/// Typed access to the profiles collection
#[derive(Clone)]
pub struct ProfileStore {
    coll: MongoCollection<ProfileDoc>,
}

impl ProfileStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            coll: client.collection::<ProfileDoc>(PROFILE_COLLECTION).await?,
        })
    }

    /// Create or update the profile owned by `owner` in one store call.
    ///
    /// The unique owner index plus a single upsert makes create-or-update
    /// atomic; there is no separate existence check to race against.
    /// Supplied fields are merged in, absent fields are left unchanged,
    /// and the sub-collections are initialized only on insert.
    pub async fn upsert(&self, owner: ObjectId, fields: &ProfileFields) -> Result<ProfileDoc> {
        let mut set = fields.set_document();
        set.insert("metadata.updated_at", DateTime::now());

        let update = doc! {
            "$set": set,
            "$inc": { "revision": 1 },
            "$setOnInsert": {
                "user": owner,
                "experience": [],
                "education": [],
                "metadata.created_at": DateTime::now(),
            },
        };

        self.coll.upsert_one(doc! { "user": owner }, update).await
    }

    pub async fn find_by_owner(&self, owner: ObjectId) -> Result<Option<ProfileDoc>> {
        self.coll.find_one(doc! { "user": owner }).await
    }

    /// Load the owner's profile or report `NotFound`
    pub async fn get_by_owner(&self, owner: ObjectId) -> Result<ProfileDoc> {
        self.find_by_owner(owner)
            .await?
            .ok_or_else(|| ApiError::NotFound("profile".into()))
    }

    pub async fn find_all(&self) -> Result<Vec<ProfileDoc>> {
        self.coll.find_many(doc! {}, None).await
    }

    pub async fn add_experience(
        &self,
        owner: ObjectId,
        entry: ExperienceEntry,
    ) -> Result<ProfileDoc> {
        super::mutate(&self.coll, doc! { "user": owner }, "profile", move |p| {
            p.prepend_experience(entry.clone());
            Ok(())
        })
        .await
    }

    pub async fn remove_experience(&self, owner: ObjectId, entry_id: &str) -> Result<ProfileDoc> {
        super::mutate(&self.coll, doc! { "user": owner }, "profile", move |p| {
            p.remove_experience(entry_id)
        })
        .await
    }

    pub async fn add_education(
        &self,
        owner: ObjectId,
        entry: EducationEntry,
    ) -> Result<ProfileDoc> {
        super::mutate(&self.coll, doc! { "user": owner }, "profile", move |p| {
            p.prepend_education(entry.clone());
            Ok(())
        })
        .await
    }

    pub async fn remove_education(&self, owner: ObjectId, entry_id: &str) -> Result<ProfileDoc> {
        super::mutate(&self.coll, doc! { "user": owner }, "profile", move |p| {
            p.remove_education(entry_id)
        })
        .await
    }

    pub async fn delete_by_owner(&self, owner: ObjectId) -> Result<()> {
        self.coll.delete_one(doc! { "user": owner }).await?;
        Ok(())
    }
}
