//! Repository layer: the path-addressed document store the tree lives in.
//!
//! # Responsibility
//! - Define the store contract consumed by services.
//! - Isolate SQLite details from tree orchestration.
//!
//! # Invariants
//! - Paths are validated before any storage access.
//! - Store APIs distinguish `NotFound` from transport failures.

pub mod document_store;
pub mod sqlite_store;
