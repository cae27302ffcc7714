pub mod document;
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Schema-less record as it travels between handlers and the store
pub type Document = Map<String, Value>;

/// Errors from a DocumentStore
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// The five named collections of the Acoustica database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Instructors,
    Classes,
    Users,
    Selected,
    AddedClasses,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Instructors => "instructors",
            Collection::Classes => "classes",
            Collection::Users => "users",
            Collection::Selected => "selected",
            Collection::AddedClasses => "add-class",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Acknowledgment of a single insert, shaped like the driver's own result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// Acknowledgment of a single-document update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

/// Storage seam every handler goes through. One implementation talks to
/// MongoDB; the in-memory one backs tests and local runs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document, generating `_id` when the caller did not supply one
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertAck, StoreError>;

    /// Every document in the collection, unfiltered, in storage order
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// First document whose `field` equals `value`
    async fn find_one_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError>;

    /// `$set` a single field on the document addressed by its hex ObjectId.
    /// With `upsert`, a missing document is created as `{_id, field: value}`.
    async fn set_field_by_id(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError>;

    /// Round-trip to the backend to confirm it is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
