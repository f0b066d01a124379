//! Recursive subtree deletion with a fallback chain.
//!
//! # Responsibility
//! - Delete a node and every descendant, children before parents.
//! - Recover when the caller-supplied path is missing, short or stale.
//!
//! # Invariants
//! - States run strictly in order: Normalize, PrimaryDelete, FallbackRoot,
//!   FallbackSearch. Each later state runs only if the previous one failed.
//! - When every strategy fails on a store error, the PrimaryDelete error is returned.
//! - When every strategy finds nothing and the store never failed, the node is
//!   already absent: the delete succeeds unless strict mode asks for `NotFound`.
//! - Deletion is not atomic: a failure midway can leave the ancestor in place
//!   with some descendants already gone.

use crate::model::path::{display_path, CollectionLayout, NodeLevel, NodeRef};
use crate::repo::document_store::DocumentStore;
use crate::service::error::ContentTreeError;
use log::{debug, info, warn};

/// States of the deletion state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    /// Classify the supplied path.
    Normalize,
    /// Post-order delete at the normalized location.
    PrimaryDelete(NodeRef),
    /// Retry assuming the node is a root category.
    FallbackRoot(NodeRef),
    /// Scan categories, topics and content for the id.
    FallbackSearch,
    /// Every strategy failed.
    Failed,
    /// No strategy found the node and no store error occurred.
    AlreadyAbsent,
    /// The node and its subtree are gone.
    Done(NodeRef),
}

impl DeleteState {
    fn name(&self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::PrimaryDelete(_) => "primary_delete",
            Self::FallbackRoot(_) => "fallback_root",
            Self::FallbackSearch => "fallback_search",
            Self::Failed => "failed",
            Self::AlreadyAbsent => "already_absent",
            Self::Done(_) => "done",
        }
    }
}

/// States visited by one successful deletion, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Location that was actually deleted; `None` when the node was already absent.
    pub deleted: Option<NodeRef>,
    pub trace: Vec<DeleteState>,
}

/// Deletes subtrees from a store.
pub struct SubtreeDeleter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    layout: &'a CollectionLayout,
    strict: bool,
}

impl<'a, S: DocumentStore + ?Sized> SubtreeDeleter<'a, S> {
    pub fn new(store: &'a S, layout: &'a CollectionLayout) -> Self {
        Self {
            store,
            layout,
            strict: false,
        }
    }

    /// Reports an unresolved node as `NotFound` instead of already absent.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Runs the fallback chain for `node_id` with the caller-supplied `path`.
    pub async fn delete(
        &self,
        node_id: &str,
        path: &[String],
    ) -> Result<DeleteOutcome, ContentTreeError> {
        let mut trace = Vec::new();
        let mut state = DeleteState::Normalize;
        let mut primary_error: Option<ContentTreeError> = None;
        let mut store_failed = false;

        loop {
            trace.push(state.clone());
            let next = match &state {
                DeleteState::Normalize => {
                    DeleteState::PrimaryDelete(self.normalize(node_id, path))
                }
                DeleteState::PrimaryDelete(target) => match self.delete_existing(target).await {
                    Ok(()) => DeleteState::Done(target.clone()),
                    Err(err) => {
                        warn!(
                            "event=node_delete module=service status=retry state=primary_delete node={} error={}",
                            target, err
                        );
                        let root = NodeRef::category(node_id);
                        let next = if *target == root {
                            DeleteState::FallbackSearch
                        } else {
                            DeleteState::FallbackRoot(root)
                        };
                        store_failed |= !matches!(err, ContentTreeError::NotFound(_));
                        primary_error = Some(err);
                        next
                    }
                },
                DeleteState::FallbackRoot(target) => match self.delete_existing(target).await {
                    Ok(()) => DeleteState::Done(target.clone()),
                    Err(err) => {
                        warn!(
                            "event=node_delete module=service status=retry state=fallback_root node={} error={}",
                            target, err
                        );
                        store_failed |= !matches!(err, ContentTreeError::NotFound(_));
                        DeleteState::FallbackSearch
                    }
                },
                DeleteState::FallbackSearch => match self.search_and_delete(node_id).await {
                    Ok(Some(found)) => DeleteState::Done(found),
                    Ok(None) if store_failed || self.strict => DeleteState::Failed,
                    Ok(None) => DeleteState::AlreadyAbsent,
                    Err(err) => {
                        warn!(
                            "event=node_delete module=service status=error state=fallback_search node_id={} error={}",
                            node_id, err
                        );
                        DeleteState::Failed
                    }
                },
                DeleteState::Failed => {
                    return Err(primary_error
                        .unwrap_or_else(|| ContentTreeError::NotFound(node_id.to_string())));
                }
                DeleteState::Done(deleted) => {
                    info!(
                        "event=node_delete module=service status=ok node={} path={} attempts={}",
                        deleted,
                        display_path(&deleted.encode(self.layout)),
                        trace.len() - 2
                    );
                    return Ok(DeleteOutcome {
                        deleted: Some(deleted.clone()),
                        trace,
                    });
                }
                DeleteState::AlreadyAbsent => {
                    info!(
                        "event=node_delete module=service status=already_absent node_id={} path={}",
                        node_id,
                        display_path(path)
                    );
                    return Ok(DeleteOutcome {
                        deleted: None,
                        trace,
                    });
                }
            };
            debug!(
                "event=node_delete_transition module=service from={} to={}",
                state.name(),
                next.name()
            );
            state = next;
        }
    }

    /// Maps the supplied path to a location, assuming a root category for
    /// anything that does not decode to a node with id `node_id`.
    fn normalize(&self, node_id: &str, path: &[String]) -> NodeRef {
        if NodeLevel::from_path_len(path.len()).is_some() {
            match NodeRef::decode(path, self.layout) {
                Ok(node_ref) if node_ref.id() == node_id => return node_ref,
                Ok(node_ref) => debug!(
                    "event=node_delete module=service status=normalize node_id={} path_id={} action=assume_root",
                    node_id,
                    node_ref.id()
                ),
                Err(err) => debug!(
                    "event=node_delete module=service status=normalize node_id={} error={} action=assume_root",
                    node_id, err
                ),
            }
        }
        NodeRef::category(node_id)
    }

    /// Deletes the subtree at `target`, failing with `NotFound` when the
    /// target document does not exist.
    async fn delete_existing(&self, target: &NodeRef) -> Result<(), ContentTreeError> {
        let path = target.encode(self.layout);
        if self.store.get(&path).await?.is_none() {
            return Err(ContentTreeError::NotFound(target.id().to_string()));
        }
        self.delete_subtree(target).await
    }

    /// Post-order delete: children (and their children) first, then the node.
    async fn delete_subtree(&self, target: &NodeRef) -> Result<(), ContentTreeError> {
        if let Some(collection) = target.child_collection(self.layout) {
            for (child_id, _) in self.store.list(&collection, None).await? {
                let Some(child) = target.child(child_id) else {
                    continue;
                };
                if let Some(grandchildren) = child.child_collection(self.layout) {
                    for (grandchild_id, _) in self.store.list(&grandchildren, None).await? {
                        if let Some(grandchild) = child.child(grandchild_id) {
                            self.store.delete(&grandchild.encode(self.layout)).await?;
                        }
                    }
                }
                self.store.delete(&child.encode(self.layout)).await?;
            }
        }
        self.store.delete(&target.encode(self.layout)).await?;
        Ok(())
    }

    /// Scans categories, then every category's topics, then every topic's
    /// content for `node_id` and deletes the first match with its subtree.
    async fn search_and_delete(&self, node_id: &str) -> Result<Option<NodeRef>, ContentTreeError> {
        let categories: Vec<NodeRef> = self
            .store
            .list(&self.layout.root_path(), None)
            .await?
            .into_iter()
            .map(|(id, _)| NodeRef::category(id))
            .collect();
        if let Some(found) = categories.iter().find(|node| node.id() == node_id) {
            self.delete_subtree(found).await?;
            return Ok(Some(found.clone()));
        }

        let topics = self.list_children_lenient(&categories).await;
        if let Some(found) = topics.iter().find(|node| node.id() == node_id) {
            self.delete_subtree(found).await?;
            return Ok(Some(found.clone()));
        }

        let contents = self.list_children_lenient(&topics).await;
        if let Some(found) = contents.iter().find(|node| node.id() == node_id) {
            self.delete_subtree(found).await?;
            return Ok(Some(found.clone()));
        }
        Ok(None)
    }

    /// Lists the children of every parent, skipping collections that fail to list.
    async fn list_children_lenient(&self, parents: &[NodeRef]) -> Vec<NodeRef> {
        let mut children = Vec::new();
        for parent in parents {
            let Some(collection) = parent.child_collection(self.layout) else {
                continue;
            };
            match self.store.list(&collection, None).await {
                Ok(entries) => children.extend(
                    entries
                        .into_iter()
                        .filter_map(|(id, _)| parent.child(id)),
                ),
                Err(err) => warn!(
                    "event=node_delete module=service status=skip state=fallback_search collection={} error={}",
                    display_path(&collection),
                    err
                ),
            }
        }
        children
    }
}

