//! Service configuration.
//!
//! # Responsibility
//! - Name the store collections the tree lives in.
//! - Bound identifier generation work.
//!
//! # Invariants
//! - Every field has a default, so partial JSON config documents are accepted.

use crate::model::path::CollectionLayout;
use serde::Deserialize;

/// Collision probes attempted before falling back to a timestamp suffix.
pub const DEFAULT_MAX_SLUG_ATTEMPTS: u32 = 100;

/// Content tree service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentTreeConfig {
    pub layout: CollectionLayout,
    pub max_slug_attempts: u32,
    /// Deleting a node no strategy can find fails with `NotFound` instead of
    /// succeeding as already absent.
    pub strict_delete: bool,
}

impl Default for ContentTreeConfig {
    fn default() -> Self {
        Self {
            layout: CollectionLayout::default(),
            max_slug_attempts: DEFAULT_MAX_SLUG_ATTEMPTS,
            strict_delete: false,
        }
    }
}

impl ContentTreeConfig {
    /// Parses a JSON configuration document, filling unset fields with defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
