//! Collision-resistant identifier generation.
//!
//! # Responsibility
//! - Derive URL-safe slugs from titles.
//! - Probe a sibling collection and suffix the slug until it is free.
//!
//! # Invariants
//! - Slugs only contain `[a-z0-9-]` and never start or end with `-`.
//! - The returned id is free at the moment of the last probe. Concurrent
//!   creators with the same title can still race to the same id.

use crate::repo::document_store::{DocumentStore, StoreResult};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("valid unsafe chars regex"));
static SEPARATOR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid separator regex"));

/// Base used when a title has no slug-safe characters at all.
pub const EMPTY_SLUG_FALLBACK: &str = "untitled";

/// Converts a title into a lowercase, hyphen-separated slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = UNSAFE_CHARS_RE.replace_all(&lowered, "");
    let hyphenated = SEPARATOR_RUN_RE.replace_all(&stripped, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Returns an id derived from `title` that is unused in `siblings`.
///
/// Tries `slug`, then `slug-1` .. `slug-{max_attempts}`, then `slug-<epoch ms>`.
pub async fn generate_unique_id<S: DocumentStore + ?Sized>(
    store: &S,
    title: &str,
    siblings: &[String],
    max_attempts: u32,
) -> StoreResult<String> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = EMPTY_SLUG_FALLBACK.to_string();
    }

    if !is_taken(store, siblings, &base).await? {
        return Ok(base);
    }
    for suffix in 1..=max_attempts {
        let candidate = format!("{base}-{suffix}");
        if !is_taken(store, siblings, &candidate).await? {
            debug!(
                "event=slug_generate module=service status=ok base={base} suffix={suffix}"
            );
            return Ok(candidate);
        }
    }

    let fallback = format!("{base}-{}", chrono::Utc::now().timestamp_millis());
    warn!(
        "event=slug_generate module=service status=fallback base={base} attempts={max_attempts} id={fallback}"
    );
    Ok(fallback)
}

async fn is_taken<S: DocumentStore + ?Sized>(
    store: &S,
    siblings: &[String],
    candidate: &str,
) -> StoreResult<bool> {
    let mut path = siblings.to_vec();
    path.push(candidate.to_string());
    Ok(store.get(&path).await?.is_some())
}
