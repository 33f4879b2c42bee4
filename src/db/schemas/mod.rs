//! Database schemas for Parlor
//!
//! Defines the three aggregate kinds: users, profiles, and posts.
//! Profiles and posts embed their sub-collections (experience, education,
//! likes, comments) and are always loaded and persisted as one unit.

mod metadata;
mod post;
mod profile;
mod user;

pub use metadata::Metadata;
pub use post::{Comment, Like, PostDoc, POST_COLLECTION};
pub use profile::{
    EducationEntry, ExperienceEntry, ProfileDoc, ProfileFields, SocialLinks, PROFILE_COLLECTION,
};
pub use user::{gravatar_url, UserDoc, USER_COLLECTION};
