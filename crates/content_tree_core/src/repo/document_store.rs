//! Path-addressed document store contract and in-memory implementation.
//!
//! # Responsibility
//! - Define the get/set/update/delete/list surface the content tree consumes.
//! - Validate document and collection paths before touching storage.
//! - Provide a map-backed store for tests and embedded callers.
//!
//! # Invariants
//! - Document paths have even length >= 2; collection paths have odd length.
//! - Deleting a document never touches its child collections.
//! - Deleting an absent document succeeds; updating one fails with `NotFound`.
//! - Ordered listings put documents missing the order field last, ties by id.

use crate::db::DbError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};

/// One stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Result type used by document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from document store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Document to update does not exist.
    NotFound(String),
    /// Path has the wrong shape for the requested operation.
    InvalidPath(String),
    /// Listing query cannot be executed as requested.
    InvalidQuery(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Stored or supplied data is not a valid document.
    Serialization(serde_json::Error),
    /// Backend refused or could not serve the request.
    Unavailable(String),
    /// Shared state lock was poisoned by a panicking writer.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::InvalidPath(message) => write!(f, "invalid store path: {message}"),
            Self::InvalidQuery(message) => write!(f, "invalid store query: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid document data: {err}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
            Self::LockPoisoned => write!(f, "document store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Hierarchical document store addressed by segment paths.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads one document, `None` when absent.
    async fn get(&self, path: &[String]) -> StoreResult<Option<Document>>;
    /// Creates or replaces one document.
    async fn set(&self, path: &[String], data: Document) -> StoreResult<()>;
    /// Merges top-level fields into an existing document.
    async fn update(&self, path: &[String], patch: Document) -> StoreResult<()>;
    /// Deletes one document. Child collections are left untouched.
    async fn delete(&self, path: &[String]) -> StoreResult<()>;
    /// Lists `(id, document)` pairs of one collection, optionally ordered
    /// ascending by a top-level field.
    async fn list(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, path: &[String]) -> StoreResult<Option<Document>> {
        (**self).get(path).await
    }

    async fn set(&self, path: &[String], data: Document) -> StoreResult<()> {
        (**self).set(path, data).await
    }

    async fn update(&self, path: &[String], patch: Document) -> StoreResult<()> {
        (**self).update(path, patch).await
    }

    async fn delete(&self, path: &[String]) -> StoreResult<()> {
        (**self).delete(path).await
    }

    async fn list(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>> {
        (**self).list(collection, order_by).await
    }
}

/// Splits a document path into `(collection key, document id)`.
pub(crate) fn split_document_path(path: &[String]) -> StoreResult<(String, String)> {
    if path.len() < 2 || path.len() % 2 != 0 {
        return Err(StoreError::InvalidPath(format!(
            "document path must have even length >= 2, got {}",
            path.len()
        )));
    }
    validate_segments(path)?;
    let (id, collection) = path
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath("empty document path".to_string()))?;
    Ok((collection.join("/"), id.clone()))
}

/// Joins a collection path into its storage key.
pub(crate) fn collection_key(collection: &[String]) -> StoreResult<String> {
    if collection.len() % 2 != 1 {
        return Err(StoreError::InvalidPath(format!(
            "collection path must have odd length, got {}",
            collection.len()
        )));
    }
    validate_segments(collection)?;
    Ok(collection.join("/"))
}

/// Rejects order fields that are not plain top-level identifiers.
pub(crate) fn validate_order_field(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if !valid {
        return Err(StoreError::InvalidQuery(format!(
            "unsupported order field `{field}`"
        )));
    }
    Ok(())
}

fn validate_segments(path: &[String]) -> StoreResult<()> {
    for segment in path {
        if segment.is_empty() || segment.contains('/') {
            return Err(StoreError::InvalidPath(format!(
                "invalid segment `{segment}` in `{}`",
                path.join("/")
            )));
        }
    }
    Ok(())
}

/// Map-backed document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored documents across all collections.
    pub fn document_count(&self) -> StoreResult<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections.values().map(BTreeMap::len).sum())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &[String]) -> StoreResult<Option<Document>> {
        let (collection, id) = split_document_path(path)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(&id))
            .cloned())
    }

    async fn set(&self, path: &[String], data: Document) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections.entry(collection).or_default().insert(id, data);
        Ok(())
    }

    async fn update(&self, path: &[String], patch: Document) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let document = collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound(path.join("/")))?;
        document.extend(patch);
        Ok(())
    }

    async fn delete(&self, path: &[String]) -> StoreResult<()> {
        let (collection, id) = split_document_path(path)?;
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        if let Some(documents) = collections.get_mut(&collection) {
            documents.remove(&id);
            if documents.is_empty() {
                collections.remove(&collection);
            }
        }
        Ok(())
    }

    async fn list(
        &self,
        collection: &[String],
        order_by: Option<&str>,
    ) -> StoreResult<Vec<(String, Document)>> {
        let key = collection_key(collection)?;
        if let Some(field) = order_by {
            validate_order_field(field)?;
        }
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut items: Vec<(String, Document)> = collections
            .get(&key)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, document)| (id.clone(), document.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(field) = order_by {
            // Stable sort keeps id order for equal keys.
            items.sort_by(|(_, left), (_, right)| compare_field(left.get(field), right.get(field)));
        }
        Ok(items)
    }
}

fn compare_field(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(f64::MAX);
            let b = b.as_f64().unwrap_or(f64::MAX);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, Some(_)) => Ordering::Greater,
        (Some(_), Some(Value::Null) | None) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
