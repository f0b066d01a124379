//! Core of the content tree: a three-level category → topic → content
//! hierarchy stored in a path-addressed document store.
//! This crate is the single source of truth for tree invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::ContentTreeConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::node::{ContentNode, ContentStats, NewNode, NodeDocument, NodeKind, NodePatch};
pub use model::path::{CollectionLayout, NodeLevel, NodeRef, PathError};
pub use repo::document_store::{
    Document, DocumentStore, MemoryDocumentStore, StoreError, StoreResult,
};
pub use repo::sqlite_store::SqliteDocumentStore;
pub use service::content_tree_service::ContentTreeService;
pub use service::error::ContentTreeError;
pub use service::slug::{generate_unique_id, slugify};
pub use service::subtree_deleter::{DeleteOutcome, DeleteState, SubtreeDeleter};
pub use service::tree_loader::{PartialTreeError, TreeLoad, TreeLoader};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
