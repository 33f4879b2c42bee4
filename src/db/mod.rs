//! MongoDB client and collection wrapper

pub mod schemas;

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::StreamExt;
use mongodb::{
    options::{IndexOptions, ReturnDocument},
    results::DeleteResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::ApiError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client and verify the connection
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ApiError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ApiError::Database(format!("failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ApiError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, ApiError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ApiError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), ApiError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ApiError::Database(format!("failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps.
    ///
    /// A unique-index violation surfaces as `Conflict` so callers can
    /// distinguish a duplicate from a store outage.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, ApiError> {
        let metadata = item.mut_metadata();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self.inner.insert_one(item).await.map_err(|e| {
            let text = e.to_string();
            if text.contains("duplicate key") || text.contains("E11000") {
                ApiError::Conflict("document already exists".into())
            } else {
                ApiError::Database(format!("insert failed: {}", e))
            }
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Database("failed to get inserted id".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, ApiError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ApiError::Database(format!("find failed: {}", e)))
    }

    /// Find many documents by filter, optionally sorted
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, ApiError> {
        let mut find = self.inner.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }

        let cursor = find
            .await
            .map_err(|e| ApiError::Database(format!("find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Replace a document matching `filter`, returning whether it matched.
    ///
    /// Used with a revision guard in the filter: a false return means the
    /// document either vanished or was modified since it was loaded.
    pub async fn replace_one(&self, filter: Document, replacement: &T) -> Result<bool, ApiError> {
        let result = self
            .inner
            .replace_one(filter, replacement)
            .await
            .map_err(|e| ApiError::Database(format!("replace failed: {}", e)))?;

        Ok(result.matched_count == 1)
    }

    /// Atomic update-or-insert returning the resulting document
    pub async fn upsert_one(&self, filter: Document, update: Document) -> Result<T, ApiError> {
        self.inner
            .find_one_and_update(filter, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| ApiError::Database(format!("upsert failed: {}", e)))?
            .ok_or_else(|| ApiError::Database("upsert returned no document".into()))
    }

    /// Delete one document by filter
    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, ApiError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| ApiError::Database(format!("delete failed: {}", e)))
    }

    /// Delete every document matching the filter
    pub async fn delete_many(&self, filter: Document) -> Result<DeleteResult, ApiError> {
        self.inner
            .delete_many(filter)
            .await
            .map_err(|e| ApiError::Database(format!("delete failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}
