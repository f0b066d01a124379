//! Content tree use-case services.
//!
//! # Responsibility
//! - Orchestrate document store calls into tree-level operations.
//! - Keep UI and host layers decoupled from storage paths.

pub mod content_tree_service;
pub mod error;
pub mod slug;
pub mod subtree_deleter;
pub mod tree_loader;
