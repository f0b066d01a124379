//! Domain model for the category/topic/content tree.
//!
//! # Responsibility
//! - Define typed node references and their wire path encoding.
//! - Define the node read model, stored document shape and inputs.
//!
//! # Invariants
//! - Node paths have length 2, 4 or 6 and never change after creation.
//! - The tree never grows deeper than three levels.

pub mod node;
pub mod path;
