//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist path-addressed JSON documents in one `documents` table.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - A document is keyed by `(collection_path, doc_id)`.
//! - Ordered listing is deterministic: order field ASC (missing last), `doc_id` ASC.
//! - Unordered listing is `doc_id` ASC.

use crate::db::migrations::latest_version;
use crate::repo::document_store::{
    collection_key, split_document_path, validate_order_field, Document, DocumentStore,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

const REQUIRED_COLUMNS: [&str; 3] = ["collection_path", "doc_id", "data"];

/// Document store over a migrated SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn get_sync(&self, path: &[String]) -> StoreResult<Option<Document>> {
        let (collection, id) = split_document_path(path)?;
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data
                 FROM documents
                 WHERE collection_path = ?1
                   AND doc_id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|text| parse_document(&text)).transpose()
    }

    fn set_sync(&self, path: &[String], data: Document) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let text = serde_json::to_string(&data)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection_path, doc_id, data)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection_path, doc_id) DO UPDATE
             SET data = excluded.data,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![collection, id, text],
        )?;
        Ok(())
    }

    fn update_sync(&self, path: &[String], patch: Document) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current: Option<String> = tx
            .query_row(
                "SELECT data
                 FROM documents
                 WHERE collection_path = ?1
                   AND doc_id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        let mut document = match current {
            Some(text) => parse_document(&text)?,
            None => return Err(StoreError::NotFound(path.join("/"))),
        };
        document.extend(patch);
        tx.execute(
            "UPDATE documents
             SET data = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection_path = ?1
               AND doc_id = ?2;",
            params![collection, id, serde_json::to_string(&document)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_sync(&self, path: &[String]) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents
             WHERE collection_path = ?1
               AND doc_id = ?2;",
            params![collection, id],
        )?;
        Ok(())
    }

    fn list_sync(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>> {
        let key = collection_key(collection)?;
        let conn = self.lock()?;
        let mut items = Vec::new();
        match order_by {
            Some(field) => {
                validate_order_field(field)?;
                let mut stmt = conn.prepare(
                    "SELECT doc_id, data
                     FROM documents
                     WHERE collection_path = ?1
                     ORDER BY json_extract(data, ?2) IS NULL ASC,
                              json_extract(data, ?2) ASC,
                              doc_id ASC;",
                )?;
                let mut rows = stmt.query(params![key, format!("$.{field}")])?;
                while let Some(row) = rows.next()? {
                    let data: String = row.get(1)?;
                    items.push((row.get(0)?, parse_document(&data)?));
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT doc_id, data
                     FROM documents
                     WHERE collection_path = ?1
                     ORDER BY doc_id ASC;",
                )?;
                let mut rows = stmt.query([key])?;
                while let Some(row) = rows.next()? {
                    let data: String = row.get(1)?;
                    items.push((row.get(0)?, parse_document(&data)?));
                }
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &[String]) -> StoreResult<Option<Document>> {
        self.get_sync(path)
    }

    async fn set(&self, path: &[String], data: Document) -> StoreResult<()> {
        self.set_sync(path, data)
    }

    async fn update(&self, path: &[String], patch: Document) -> StoreResult<()> {
        self.update_sync(path, patch)
    }

    async fn delete(&self, path: &[String]) -> StoreResult<()> {
        self.delete_sync(path)
    }

    async fn list(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>> {
        self.list_sync(collection, order_by)
    }
}

fn parse_document(text: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Unavailable(format!(
            "stored document is not a JSON object: {other}"
        ))),
    }
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::Unavailable(format!(
            "document store requires schema version {expected_version}, got {actual_version}"
        )));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(documents);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(StoreError::Unavailable(format!(
                "document store requires column `{column}` in table `documents`"
            )));
        }
    }
    Ok(())
}
