use super::{Document, DocumentId, DocumentStore, Record, StoreError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-local store used by tests and `memory://` connections.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Document>>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store mutex poisoned".to_string()))
    }

    /// Inserts a document under a caller-chosen id.
    pub fn insert_with_id(
        &self,
        collection: &str,
        id: DocumentId,
        fields: Record,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard
            .entry(collection.to_string())
            .or_default()
            .push(Document { id, fields });
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        Ok(guard.get(collection).map_or(0, |docs| docs.len() as u64))
    }

    fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| &doc.id == id))
            .cloned())
    }

    fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.fields.get(field) == Some(value)))
            .cloned())
    }

    fn insert_one(&self, collection: &str, record: Record) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        self.insert_with_id(collection, id, record)?;
        Ok(id)
    }

    fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        let mut guard = self.lock()?;
        let docs = guard.entry(collection.to_string()).or_default();
        let mut ids = Vec::with_capacity(records.len());
        for fields in records {
            let id = DocumentId::generate();
            docs.push(Document { id, fields });
            ids.push(id);
        }
        Ok(ids)
    }
}
