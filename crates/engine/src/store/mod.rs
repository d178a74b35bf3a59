//! Document store contract and its implementations.
//!
//! A store keeps JSON documents grouped in collections. Identity, ownership
//! and timestamps live outside the body and are assigned by the store; the
//! body only carries entity fields.
//!
//! - [`SqlStore`] persists to SQLite through sea-orm.
//! - [`MemoryStore`] keeps everything in process; used as a test fake.
//!
//! A body carrying a `nameKey` must not share its value with another
//! document of the same owner in the same collection. Both stores enforce
//! this on write and fail with [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{query::Predicate, query::QuerySpec, util::format_timestamp};

pub use feed::{ChangeEvent, ChangeKind, Subscription};
pub use memory::MemoryStore;
pub use sql::SqlStore;

mod feed;
mod memory;
mod sql;

/// Body field holding the per-owner unique key of a document.
pub(crate) const UNIQUE_KEY_FIELD: &str = "nameKey";

/// Errors raised by a [`DocumentStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("corrupt document {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("unique key already taken: {0}")]
    Conflict(String),
    #[error("unsupported query: {0}")]
    Unsupported(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("subscription lagged behind by {0} events")]
    Lagged(u64),
    #[error("change feed closed")]
    Closed,
}

/// A stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Reads a field by its query name.
    ///
    /// `id`, `userId`, `createdAt` and `updatedAt` resolve to the store-managed
    /// metadata (timestamps as fixed-width RFC3339 strings); any other name is
    /// looked up in the body.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "userId" => Some(Value::String(self.user_id.clone())),
            "createdAt" => Some(Value::String(format_timestamp(self.created_at))),
            "updatedAt" => Some(Value::String(format_timestamp(self.updated_at))),
            other => self.fields.get(other).cloned(),
        }
    }
}

/// Result of an atomic [`DocumentStore::increment`].
#[derive(Clone, Debug, PartialEq)]
pub enum IncrementOutcome {
    /// The delta was applied; carries the updated document.
    Applied(Document),
    /// The result would have gone below the floor; carries the untouched
    /// document.
    Rejected(Document),
    Missing,
}

/// Storage backend contract used by the engine.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns it with id and timestamps assigned.
    /// Fails with [`StoreError::Conflict`] if its unique key is taken.
    async fn create(
        &self,
        collection: &str,
        user_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Runs a query. Ties in the sort key come back in the store's natural
    /// order, which callers must treat as undefined.
    async fn query(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, predicates: &[Predicate]) -> Result<u64, StoreError>;

    /// Merges `changes` into the body. Returns `None` if the document is absent
    /// and [`StoreError::Conflict`] if the merged unique key is taken.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Adds `delta` to an integer field as one atomic step. With a `floor`,
    /// the change is rejected if the result would be lower than it.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> Result<IncrementOutcome, StoreError>;

    /// Subscribes to changes of documents in `collection` matching all
    /// `predicates`.
    fn listen(&self, collection: &str, predicates: Vec<Predicate>) -> Subscription;
}
