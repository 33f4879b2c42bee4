//! Aggregate stores
//!
//! Each aggregate (user, profile, post) is loaded whole, mutated in
//! memory, and written back as one unit. List mutations go through an
//! optimistic-concurrency loop: every aggregate carries a revision
//! counter and the write-back is a conditional replace keyed on
//! `(_id, revision)`. A missed condition means another writer got there
//! first; the whole load-transform-replace cycle is retried a bounded
//! number of times and then reported as a conflict.

mod posts;
mod profiles;
mod users;

pub use posts::PostStore;
pub use profiles::ProfileStore;
pub use users::UserStore;

use bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::db::{IntoIndexes, MongoCollection, MutMetadata};
use crate::types::{ApiError, Result};

/// Attempts per mutation before giving up on a contended aggregate
const MAX_MUTATE_ATTEMPTS: usize = 3;

/// Aggregates that participate in the conditional-replace protocol
pub trait Versioned {
    fn object_id(&self) -> Option<ObjectId>;
    fn revision(&self) -> i64;
    fn bump_revision(&mut self);
}

impl Versioned for crate::db::schemas::ProfileDoc {
    fn object_id(&self) -> Option<ObjectId> {
        self._id
    }
    fn revision(&self) -> i64 {
        self.revision
    }
    fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

impl Versioned for crate::db::schemas::PostDoc {
    fn object_id(&self) -> Option<ObjectId> {
        self._id
    }
    fn revision(&self) -> i64 {
        self.revision
    }
    fn bump_revision(&mut self) {
        self.revision += 1;
    }
}

/// Load the aggregate matching `filter`, apply one in-memory transform,
/// and persist with a revision guard.
///
/// `NotFound` (no aggregate) and errors raised by the transform itself
/// abort immediately; only a failed revision guard retries.
pub(crate) async fn mutate<T, F>(
    coll: &MongoCollection<T>,
    filter: Document,
    what: &str,
    mut apply: F,
) -> Result<T>
where
    T: Serialize
        + DeserializeOwned
        + Unpin
        + Send
        + Sync
        + IntoIndexes
        + MutMetadata
        + Versioned,
    F: FnMut(&mut T) -> Result<()>,
{
    for _ in 0..MAX_MUTATE_ATTEMPTS {
        let mut aggregate = coll
            .find_one(filter.clone())
            .await?
            .ok_or_else(|| ApiError::NotFound(what.into()))?;

        let expected = aggregate.revision();
        apply(&mut aggregate)?;
        aggregate.bump_revision();
        aggregate.mut_metadata().updated_at = Some(DateTime::now());

        let id = aggregate
            .object_id()
            .ok_or_else(|| ApiError::Internal("loaded aggregate has no id".into()))?;
        let guard = doc! { "_id": id, "revision": expected };

        if coll.replace_one(guard, &aggregate).await? {
            return Ok(aggregate);
        }

        debug!("revision moved for {}, retrying", what);
    }

    Err(ApiError::Conflict(
        "aggregate was modified concurrently".into(),
    ))
}

/// Cascading account delete: posts, then profile, then user.
///
/// There is no compensating rollback. A failure after the first step has
/// completed leaves the account partially deleted and is reported as
/// `PartialDelete` naming the completed steps, so the caller can retry or
/// alert rather than treat it as generic success or failure.
pub async fn delete_account(
    users: &UserStore,
    profiles: &ProfileStore,
    posts: &PostStore,
    owner: ObjectId,
) -> Result<()> {
    posts.delete_by_author(owner).await?;

    profiles
        .delete_by_owner(owner)
        .await
        .map_err(|e| partial("posts", e))?;

    users
        .delete_by_id(owner)
        .await
        .map_err(|e| partial("posts, profile", e))?;

    Ok(())
}

fn partial(completed: &str, source: ApiError) -> ApiError {
    ApiError::PartialDelete {
        completed: completed.into(),
        source: Box::new(source),
    }
}
