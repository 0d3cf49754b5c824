//! Document store abstraction shared by the ingestor and the lookup service.
//!
//! Documents are flat JSON objects grouped into named collections. Each insert is
//! assigned a fresh [`DocumentId`]; the store itself enforces no other uniqueness.

mod id;
mod memory;
mod sqlite;

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

pub use id::{DocumentId, DocumentIdError};
pub use memory::InMemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// A flat field map, as produced by the normalizer and stored per document.
pub type Record = Map<String, Value>;

/// A record persisted in a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Record,
}

/// Storage abstraction so ingestion and lookup can run against any backend.
pub trait DocumentStore: Send + Sync {
    fn count(&self, collection: &str) -> Result<u64, StoreError>;
    fn find_by_id(&self, collection: &str, id: &DocumentId)
        -> Result<Option<Document>, StoreError>;
    /// First document (in insertion order) whose `field` equals `value`.
    fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError>;
    fn insert_one(&self, collection: &str, record: Record) -> Result<DocumentId, StoreError>;
    fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<DocumentId>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unsupported store connection string '{0}': expected memory://, sqlite::memory: or sqlite://<path>")]
    UnsupportedConnection(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("document {id} in {collection} is not a valid JSON object: {detail}")]
    Corrupt {
        collection: String,
        id: String,
        detail: String,
    },
    #[error("failed to encode document for {collection}: {source}")]
    Encode {
        collection: String,
        source: serde_json::Error,
    },
}

/// Opens the store named by a connection string.
pub fn open_store(connection_string: &str) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let trimmed = connection_string.trim();

    if trimmed == "memory://" {
        return Ok(Arc::new(InMemoryDocumentStore::default()));
    }
    if trimmed == "sqlite::memory:" {
        return Ok(Arc::new(SqliteDocumentStore::open_in_memory()?));
    }
    if let Some(path) = trimmed.strip_prefix("sqlite://") {
        if !path.is_empty() {
            return Ok(Arc::new(SqliteDocumentStore::open(path)?));
        }
    }

    Err(StoreError::UnsupportedConnection(trimmed.to_string()))
}
