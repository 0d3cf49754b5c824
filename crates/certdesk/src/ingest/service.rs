use crate::certificates::CertificateKind;
use crate::store::{DocumentStore, Record, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do with a record that lacks the collection's unique key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKeyPolicy {
    /// Fail the run before anything is written.
    #[default]
    Reject,
    /// Leave the record out and count it in [`IngestReport::missing_key`].
    Skip,
}

impl MissingKeyPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" | "error" => Some(Self::Reject),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Outcome of one ingestion run against a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub inserted: usize,
    pub skipped: usize,
    pub missing_key: usize,
    pub total_after: u64,
}

/// Inserts records that are not yet present, keyed on a caller-declared field.
///
/// Existing documents are never updated. There is no batch-wide transaction, so a failed
/// run may leave partial inserts behind; re-running is safe because every record is
/// checked against the store before insertion.
pub struct Ingestor<S: ?Sized> {
    store: Arc<S>,
    policy: MissingKeyPolicy,
}

impl<S> Ingestor<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>, policy: MissingKeyPolicy) -> Self {
        Self { store, policy }
    }

    /// Ingests into the kind's collection using its fixed unique key.
    pub fn ingest_dataset(
        &self,
        kind: CertificateKind,
        records: Vec<Record>,
    ) -> Result<IngestReport, IngestError> {
        self.ingest(kind.collection(), records, kind.unique_key())
    }

    pub fn ingest(
        &self,
        collection: &str,
        records: Vec<Record>,
        unique_key: &str,
    ) -> Result<IngestReport, IngestError> {
        let mut accepted = Vec::with_capacity(records.len());
        let mut missing_key = 0;

        for (index, record) in records.into_iter().enumerate() {
            if key_value(&record, unique_key).is_some() {
                accepted.push(record);
                continue;
            }

            match self.policy {
                MissingKeyPolicy::Reject => {
                    return Err(IngestError::MissingUniqueKey {
                        collection: collection.to_string(),
                        key: unique_key.to_string(),
                        index,
                    });
                }
                MissingKeyPolicy::Skip => {
                    warn!(
                        collection,
                        key = unique_key,
                        index,
                        "record has no unique key; skipping"
                    );
                    missing_key += 1;
                }
            }
        }

        let (inserted, skipped) = if self.store.count(collection)? == 0 {
            self.insert_batch(collection, accepted)?
        } else {
            self.insert_missing(collection, accepted, unique_key)?
        };

        let total_after = self.store.count(collection)?;
        info!(
            collection,
            inserted, skipped, missing_key, total_after, "ingestion finished"
        );

        Ok(IngestReport {
            collection: collection.to_string(),
            inserted,
            skipped,
            missing_key,
            total_after,
        })
    }

    fn insert_batch(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<(usize, usize), IngestError> {
        if records.is_empty() {
            return Ok((0, 0));
        }

        let ids = self.store.insert_many(collection, records)?;
        info!(collection, inserted = ids.len(), "collection was empty; inserted all records");
        Ok((ids.len(), 0))
    }

    fn insert_missing(
        &self,
        collection: &str,
        records: Vec<Record>,
        unique_key: &str,
    ) -> Result<(usize, usize), IngestError> {
        let mut inserted = 0;
        let mut skipped = 0;

        for record in records {
            let Some(value) = key_value(&record, unique_key).cloned() else {
                continue;
            };

            if self.store.find_one(collection, unique_key, &value)?.is_some() {
                info!(collection, key = unique_key, %value, "already exists; skipping");
                skipped += 1;
            } else {
                let id = self.store.insert_one(collection, record)?;
                info!(collection, key = unique_key, %value, %id, "inserted");
                inserted += 1;
            }
        }

        Ok((inserted, skipped))
    }
}

fn key_value<'a>(record: &'a Record, unique_key: &str) -> Option<&'a Value> {
    record.get(unique_key).filter(|value| !value.is_null())
}

/// Reads the normalizer's JSON array back into records.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, IngestError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let values: Vec<Value> = serde_json::from_str(&raw).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => Ok(record),
            _ => Err(IngestError::NotAnObject {
                path: path.to_path_buf(),
                index,
            }),
        })
        .collect()
}

/// Error raised by an ingestion run. Every variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not a JSON array of records: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("element {index} of {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf, index: usize },
    #[error("record {index} for {collection} has no '{key}' value")]
    MissingUniqueKey {
        collection: String,
        key: String,
        index: usize,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
