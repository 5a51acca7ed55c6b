//! Capture record persistence and queries.
//!
//! # Responsibilities
//! - Insert capture records with JSON-serialized mapping columns
//! - Paginated newest-first listing, lookup, delete, full reset
//! - Decode stored JSON columns defensively
//!
//! # Design Decisions
//! - `delete_all` also resets the autoincrement sequence: capture ids are
//!   ephemeral debugging handles, and after a reset the next record is id 1
//! - A mapping column that fails to parse decodes to an empty object, so
//!   corruption in one record never blocks listing or reading the rest

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{Database, StorageError};

/// One persisted observation of an inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub full_url: String,
    pub query_params: Value,
    pub headers: Value,
    pub body: String,
    pub form_data: Value,
    pub files: Value,
    pub client_ip: String,
    pub created_at: String,
}

/// The fields of a record about to be written. `created_at` is assigned by
/// the capture pipeline before the write reaches the store.
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub method: String,
    pub path: String,
    pub full_url: String,
    pub query_params: Value,
    pub headers: Value,
    pub body: String,
    pub form_data: Value,
    pub files: Value,
    pub client_ip: String,
    pub created_at: String,
}

/// Typed access to the `requests` table.
#[derive(Clone)]
pub struct RequestRepository {
    db: Database,
}

impl RequestRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a record and read it back as stored.
    pub async fn store(&self, new: NewCapture) -> Result<CaptureRecord, StorageError> {
        let query_params = encode_column("query_params", &new.query_params)?;
        let headers = encode_column("headers", &new.headers)?;
        let form_data = encode_column("form_data", &new.form_data)?;
        let files = encode_column("files", &new.files)?;

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO requests
                        (method, path, full_url, query_params, headers, body,
                         form_data, files, client_ip, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        new.method,
                        new.path,
                        new.full_url,
                        query_params,
                        headers,
                        new.body,
                        form_data,
                        files,
                        new.client_ip,
                        new.created_at,
                    ],
                )?;

                let id = conn.last_insert_rowid();
                let record = conn.query_row(
                    "SELECT * FROM requests WHERE id = ?1",
                    params![id],
                    map_row,
                )?;
                Ok(record)
            })
            .await
    }

    /// Newest-first page of records.
    pub async fn all(&self, limit: i64, offset: i64) -> Result<Vec<CaptureRecord>, StorageError> {
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM requests ORDER BY id DESC LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt.query_map(params![limit, offset], map_row)?;

                let mut records = Vec::new();
                for row in rows {
                    records.push(row?);
                }
                Ok(records)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        self.db
            .execute(|conn| {
                let count =
                    conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }

    pub async fn find(&self, id: i64) -> Result<Option<CaptureRecord>, StorageError> {
        self.db
            .execute(move |conn| {
                let record = conn
                    .query_row("SELECT * FROM requests WHERE id = ?1", params![id], map_row)
                    .optional()?;
                Ok(record)
            })
            .await
    }

    /// Returns whether a row was actually removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.db
            .execute(move |conn| {
                let affected =
                    conn.execute("DELETE FROM requests WHERE id = ?1", params![id])?;
                Ok(affected > 0)
            })
            .await
    }

    /// Remove every record and restart the id sequence from 1.
    pub async fn delete_all(&self) -> Result<(), StorageError> {
        self.db
            .execute(|conn| {
                conn.execute("DELETE FROM requests", [])?;
                conn.execute("DELETE FROM sqlite_sequence WHERE name = 'requests'", [])?;
                conn.execute_batch("VACUUM")?;
                Ok(())
            })
            .await
    }
}

fn encode_column(column: &'static str, value: &Value) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::EncodeColumn { column, source })
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<CaptureRecord> {
    Ok(CaptureRecord {
        id: row.get("id")?,
        method: row.get("method")?,
        path: row.get("path")?,
        full_url: row.get("full_url")?,
        query_params: safe_decode(&row.get::<_, String>("query_params")?),
        headers: safe_decode(&row.get::<_, String>("headers")?),
        body: row.get::<_, Option<String>>("body")?.unwrap_or_default(),
        form_data: safe_decode(&row.get::<_, String>("form_data")?),
        files: safe_decode(&row.get::<_, String>("files")?),
        client_ip: row.get("client_ip")?,
        created_at: row.get("created_at")?,
    })
}

/// Stored mapping columns always come back as an object; anything that does
/// not parse as one degrades to an empty mapping.
fn safe_decode(payload: &str) -> Value {
    match serde_json::from_str::<Value>(payload) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}
