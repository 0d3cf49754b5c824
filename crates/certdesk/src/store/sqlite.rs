use super::{Document, DocumentId, DocumentStore, Record, StoreError};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, Params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL UNIQUE,
    body TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS documents_collection ON documents (collection);
";

/// Durable store keeping each document as a JSON body in a single SQLite table.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                StoreError::Unavailable(format!("cannot create {}: {err}", parent.display()))
            })?;
        }
        debug!(path = %path.display(), "opening sqlite document store");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".to_string()))
    }
}

fn encode(collection: &str, record: &Record) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|source| StoreError::Encode {
        collection: collection.to_string(),
        source,
    })
}

fn decode(collection: &str, id: &str, body: &str) -> Result<Document, StoreError> {
    let corrupt = |detail: String| StoreError::Corrupt {
        collection: collection.to_string(),
        id: id.to_string(),
        detail,
    };

    let document_id: DocumentId = id.parse().map_err(|err| corrupt(format!("{err}")))?;
    match serde_json::from_str::<Value>(body).map_err(|err| corrupt(err.to_string()))? {
        Value::Object(fields) => Ok(Document {
            id: document_id,
            fields,
        }),
        other => Err(corrupt(format!("expected object, found {other}"))),
    }
}

fn json_path(field: &str) -> Option<String> {
    (!field.contains('"')).then(|| format!("$.\"{field}\""))
}

fn sql_scalar(value: &Value) -> Option<SqlValue> {
    match value {
        Value::String(text) => Some(SqlValue::Text(text.clone())),
        Value::Bool(flag) => Some(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn candidate_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<(String, String)>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl DocumentStore for SqliteDocumentStore {
    fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let conn = self.lock()?;
        let key = id.to_hex();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, key],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| decode(collection, &key, &body)).transpose()
    }

    fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let conn = self.lock()?;
        let rows = match (json_path(field), sql_scalar(value)) {
            (Some(path), Some(scalar)) => candidate_rows(
                &conn,
                "SELECT id, body FROM documents WHERE collection = ?1 \
                 AND CASE WHEN json_valid(body) THEN json_extract(body, ?2) END = ?3 \
                 ORDER BY seq",
                params![collection, path, scalar],
            )?,
            (Some(path), None) => candidate_rows(
                &conn,
                "SELECT id, body FROM documents WHERE collection = ?1 \
                 AND CASE WHEN json_valid(body) THEN json_type(body, ?2) END IS NOT NULL \
                 ORDER BY seq",
                params![collection, path],
            )?,
            // Labels containing '"' cannot be expressed as a JSON path.
            (None, _) => candidate_rows(
                &conn,
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY seq",
                params![collection],
            )?,
        };

        // SQL equality is looser than JSON equality (4 = 4.0, true = 1), so confirm here.
        for (id, body) in rows {
            let document = decode(collection, &id, &body)?;
            if document.fields.get(field) == Some(value) {
                return Ok(Some(document));
            }
        }

        Ok(None)
    }

    fn insert_one(&self, collection: &str, record: Record) -> Result<DocumentId, StoreError> {
        let body = encode(collection, &record)?;
        let id = DocumentId::generate();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id.to_hex(), body],
        )?;
        Ok(id)
    }

    fn insert_many(
        &self,
        collection: &str,
        records: Vec<Record>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        let bodies = records
            .iter()
            .map(|record| encode(collection, record))
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(bodies.len());
        {
            let mut stmt =
                tx.prepare("INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)")?;
            for body in &bodies {
                let id = DocumentId::generate();
                stmt.execute(params![collection, id.to_hex(), body])?;
                ids.push(id);
            }
        }
        tx.commit()?;
        Ok(ids)
    }
}
