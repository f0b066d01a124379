//! Content tree assembly.
//!
//! # Responsibility
//! - Read root categories and, level by level, their child collections.
//! - Degrade failed subtree reads to childless nodes instead of failing the load.
//! - Skip documents that do not decode, one node at a time.
//!
//! # Invariants
//! - Depth is bounded structurally: categories -> topics -> content, nothing deeper.
//! - Siblings are ordered by `order` ascending when the store can order them.
//! - Content nodes are never asked for children.

use crate::model::node::{ContentNode, NodeDocument};
use crate::model::path::{display_path, CollectionLayout, NodeRef};
use crate::repo::document_store::{Document, DocumentStore, StoreError, StoreResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Field siblings are ordered by.
pub const ORDER_FIELD: &str = "order";

/// A node or subtree that could not be read during assembly.
#[derive(Debug)]
pub struct PartialTreeError {
    /// Path of the skipped node, or of the node whose children are missing.
    pub path: Vec<String>,
    pub error: StoreError,
}

impl Display for PartialTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` could not be fully loaded: {}",
            display_path(&self.path),
            self.error
        )
    }
}

impl Error for PartialTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Assembled forest plus the subtrees that degraded.
#[derive(Debug, Default)]
pub struct TreeLoad {
    pub roots: Vec<ContentNode>,
    pub degraded: Vec<PartialTreeError>,
}

/// Reads the whole tree from a store.
pub struct TreeLoader<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    layout: &'a CollectionLayout,
}

impl<'a, S: DocumentStore + ?Sized> TreeLoader<'a, S> {
    pub fn new(store: &'a S, layout: &'a CollectionLayout) -> Self {
        Self { store, layout }
    }

    /// Loads the full forest and reports degraded subtrees.
    ///
    /// Only a failure to list the root collection is an error.
    pub async fn load_with_report(&self) -> StoreResult<TreeLoad> {
        let started_at = Instant::now();
        let mut report = TreeLoad::default();

        let roots = self.list_ordered(&self.layout.root_path()).await?;
        for (id, document) in roots {
            let Some(mut category) =
                self.decode_node(NodeRef::category(id), document, &mut report.degraded)
            else {
                continue;
            };
            category.children = self.load_children(&category, &mut report.degraded).await;
            if let Some(topics) = category.children.as_mut() {
                for topic in topics.iter_mut() {
                    topic.children = self.load_children(topic, &mut report.degraded).await;
                }
            }
            report.roots.push(category);
        }

        info!(
            "event=tree_load module=service status={} roots={} degraded={} duration_ms={}",
            if report.degraded.is_empty() { "ok" } else { "partial" },
            report.roots.len(),
            report.degraded.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Reads the direct children of `parent`.
    ///
    /// Returns `None` for leaves and for parents whose child collection could
    /// not be listed; the latter are recorded in `degraded`. Children whose
    /// documents do not decode are recorded and skipped.
    async fn load_children(
        &self,
        parent: &ContentNode,
        degraded: &mut Vec<PartialTreeError>,
    ) -> Option<Vec<ContentNode>> {
        if parent.is_leaf() {
            return None;
        }
        let collection = parent.node_ref.child_collection(self.layout)?;

        match self.list_ordered(&collection).await {
            Ok(entries) => Some(
                entries
                    .into_iter()
                    .filter_map(|(id, document)| {
                        let child_ref = parent.node_ref.child(id)?;
                        self.decode_node(child_ref, document, degraded)
                    })
                    .collect(),
            ),
            Err(error) => {
                let path = parent.path(self.layout);
                warn!(
                    "event=tree_load module=service status=degraded path={} error={}",
                    display_path(&path),
                    error
                );
                degraded.push(PartialTreeError { path, error });
                None
            }
        }
    }

    fn decode_node(
        &self,
        node_ref: NodeRef,
        document: Document,
        degraded: &mut Vec<PartialTreeError>,
    ) -> Option<ContentNode> {
        let path = node_ref.encode(self.layout);
        match to_node(node_ref, document) {
            Ok(node) => Some(node),
            Err(error) => {
                warn!(
                    "event=tree_load module=service status=skipped path={} error={}",
                    display_path(&path),
                    error
                );
                degraded.push(PartialTreeError { path, error });
                None
            }
        }
    }

    /// Lists a collection ordered by `order`, falling back to an unordered listing.
    async fn list_ordered(&self, collection: &[String]) -> StoreResult<Vec<(String, Document)>> {
        match self.store.list(collection, Some(ORDER_FIELD)).await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(
                    "event=tree_list module=service status=unordered_fallback collection={} error={}",
                    display_path(collection),
                    err
                );
                self.store.list(collection, None).await
            }
        }
    }
}

pub(crate) fn to_node(node_ref: NodeRef, document: Document) -> StoreResult<ContentNode> {
    let document: NodeDocument = serde_json::from_value(document.into())?;
    Ok(ContentNode::from_document(node_ref, document))
}
