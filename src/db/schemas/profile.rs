//! Profile document schema
//!
//! One profile per user, owning two ordered sub-collections (experience
//! and education). Entries are kept newest-first by insertion; their ids
//! are generated at append time and are unique within the owning profile
//! only.

use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::schemas::Metadata;
use crate::db::{IntoIndexes, MutMetadata};
use crate::types::ApiError;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// A work experience entry embedded in a profile
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    /// Generated at append time
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An education entry embedded in a profile
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    /// Generated at append time
    pub id: String,
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fixed set of optional social links
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Profile document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProfileDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Owning user (unique - at most one profile per user)
    pub user: ObjectId,

    /// Optimistic concurrency counter, bumped on every replace
    #[serde(default)]
    pub revision: i64,

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

    /// Ordered skill list
    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub social: SocialLinks,

    /// Newest-first by insertion, not by date field
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,

    #[serde(default)]
    pub education: Vec<EducationEntry>,
}

impl ProfileDoc {
    /// Prepend an experience entry, assigning it a fresh id.
    ///
    /// New entries always go to the front: the list reads most-recent
    /// first regardless of the entry's own date range.
    pub fn prepend_experience(&mut self, mut entry: ExperienceEntry) -> String {
        entry.id = Uuid::new_v4().to_string();
        let id = entry.id.clone();
        self.experience.insert(0, entry);
        id
    }

    /// Remove the experience entry with the given id.
    ///
    /// A miss is an explicit `NotFound` and leaves the list untouched; it
    /// must never fall through to removing some other entry.
    pub fn remove_experience(&mut self, entry_id: &str) -> Result<(), ApiError> {
        let position = self
            .experience
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| ApiError::NotFound("experience entry".into()))?;
        self.experience.remove(position);
        Ok(())
    }

    /// Prepend an education entry, assigning it a fresh id
    pub fn prepend_education(&mut self, mut entry: EducationEntry) -> String {
        entry.id = Uuid::new_v4().to_string();
        let id = entry.id.clone();
        self.education.insert(0, entry);
        id
    }

    /// Remove the education entry with the given id
    pub fn remove_education(&mut self, entry_id: &str) -> Result<(), ApiError> {
        let position = self
            .education
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| ApiError::NotFound("education entry".into()))?;
        self.education.remove(position);
        Ok(())
    }
}

/// Partial field set for the create-or-update operation.
///
/// Fields left as `None` are not touched on update. `skills` arrives as
/// one comma-separated string and is split and trimmed into the stored
/// list.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub handle: Option<String>,
    pub status: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub github_username: Option<String>,
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl ProfileFields {
    /// Build the `$set` document for the partial merge.
    ///
    /// Only supplied fields appear, so an upsert leaves everything else
    /// as it was.
    pub fn set_document(&self) -> Document {
        let mut set = Document::new();

        let scalars = [
            ("handle", &self.handle),
            ("status", &self.status),
            ("company", &self.company),
            ("website", &self.website),
            ("location", &self.location),
            ("bio", &self.bio),
            ("github_username", &self.github_username),
        ];
        for (key, value) in scalars {
            if let Some(v) = value {
                set.insert(key, v.clone());
            }
        }

        if let Some(skills) = &self.skills {
            let list: Vec<Bson> = skills
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Bson::String(s.to_string()))
                .collect();
            set.insert("skills", Bson::Array(list));
        }

        let social = [
            ("social.youtube", &self.youtube),
            ("social.twitter", &self.twitter),
            ("social.facebook", &self.facebook),
            ("social.linkedin", &self.linkedin),
            ("social.instagram", &self.instagram),
        ];
        for (key, value) in social {
            if let Some(v) = value {
                set.insert(key, v.clone());
            }
        }

        set
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("owner_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
