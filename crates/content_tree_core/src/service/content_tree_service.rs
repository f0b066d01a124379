//! Content tree use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/delete/stats operations over the content tree.
//! - Validate hierarchy invariants above the document store.
//!
//! # Invariants
//! - Every read goes to the store; nothing is cached between calls.
//! - Paths are fixed at creation; updates never move a node.
//! - A node with a body has no children: a body is only set on a childless topic.
//! - Store errors outside tree assembly and deletion are returned unchanged.

use crate::config::ContentTreeConfig;
use crate::model::node::{ContentNode, ContentStats, NewNode, NodeKind, NodePatch};
use crate::model::path::{display_path, parent_of_collection, NodeRef, PathError};
use crate::repo::document_store::{Document, DocumentStore};
use crate::service::error::ContentTreeError;
use crate::service::slug::generate_unique_id;
use crate::service::subtree_deleter::{DeleteOutcome, SubtreeDeleter};
use crate::service::tree_loader::{to_node, TreeLoad, TreeLoader, ORDER_FIELD};
use log::{error, info};
use serde_json::Value;

/// Content tree service facade.
pub struct ContentTreeService<S: DocumentStore> {
    store: S,
    config: ContentTreeConfig,
}

impl<S: DocumentStore> ContentTreeService<S> {
    /// Creates a service with the default collection layout.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ContentTreeConfig::default())
    }

    pub fn with_config(store: S, config: ContentTreeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ContentTreeConfig {
        &self.config
    }

    /// Loads the full forest. Subtrees that fail to load come back without children.
    pub async fn get_content_tree(&self) -> Result<Vec<ContentNode>, ContentTreeError> {
        Ok(self.load_tree_with_report().await?.roots)
    }

    /// Loads the full forest together with the list of degraded subtrees.
    pub async fn load_tree_with_report(&self) -> Result<TreeLoad, ContentTreeError> {
        TreeLoader::new(&self.store, &self.config.layout)
            .load_with_report()
            .await
            .map_err(|err| {
                error!("event=tree_load module=service status=error error={err}");
                err.into()
            })
    }

    /// Creates a root category and returns its id.
    pub async fn create_root_category(&self, data: NewNode) -> Result<String, ContentTreeError> {
        let title = normalize_title(&data.title)?;
        let siblings = self.config.layout.root_path();
        let id = generate_unique_id(
            &self.store,
            &title,
            &siblings,
            self.config.max_slug_attempts,
        )
        .await?;
        let node_ref = NodeRef::category(id.clone());
        self.write_new(&node_ref, data, title).await?;
        Ok(id)
    }

    /// Creates a topic under a category or a content node under a topic and
    /// returns its id.
    ///
    /// `parent_path` is the parent's own path; with the child collection
    /// appended it must have length 3 or 5.
    pub async fn create_child(
        &self,
        parent_id: &str,
        data: NewNode,
        parent_path: &[String],
    ) -> Result<String, ContentTreeError> {
        let title = normalize_title(&data.title)?;
        let layout = &self.config.layout;

        let mut collection = parent_path.to_vec();
        collection.push(layout.child_collection.clone());
        if !matches!(collection.len(), 3 | 5) {
            return Err(PathError::InvalidLength(collection.len()).into());
        }
        let parent = parent_of_collection(&collection, layout)?;
        ensure_id_matches(parent_id, &parent)?;
        self.ensure_parent_accepts_children(&parent).await?;

        let id = generate_unique_id(
            &self.store,
            &title,
            &collection,
            self.config.max_slug_attempts,
        )
        .await?;
        let node_ref = parent
            .child(id.clone())
            .ok_or_else(|| ContentTreeError::ParentIsLeaf(parent_id.to_string()))?;
        self.write_new(&node_ref, data, title).await?;
        Ok(id)
    }

    /// Applies a partial update to title/content/icon/colorHex of one node.
    pub async fn update_node(
        &self,
        node_id: &str,
        patch: NodePatch,
        node_path: &[String],
    ) -> Result<(), ContentTreeError> {
        let node_ref = NodeRef::decode(node_path, &self.config.layout)?;
        ensure_id_matches(node_id, &node_ref)?;

        let mut patch = patch;
        if let Some(title) = patch.title.as_deref() {
            patch.title = Some(normalize_title(title)?);
        }
        if matches!(node_ref, NodeRef::Category { .. })
            && patch.content.as_deref().is_some_and(|body| !body.is_empty())
        {
            return Err(ContentTreeError::CategoryBody(node_id.to_string()));
        }
        if patch.is_empty() {
            return Ok(());
        }
        if matches!(node_ref, NodeRef::Topic { .. })
            && patch.content.as_deref().is_some_and(|body| !body.is_empty())
        {
            self.ensure_childless(&node_ref).await?;
        }

        let fields = to_document(&patch)?;
        let path = node_ref.encode(&self.config.layout);
        match self.store.update(&path, fields).await {
            Ok(()) => {
                info!(
                    "event=node_update module=service status=ok path={}",
                    display_path(&path)
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=node_update module=service status=error path={} error={err}",
                    display_path(&path)
                );
                Err(err.into())
            }
        }
    }

    /// Deletes a node with its whole subtree.
    ///
    /// `path` may be empty, short or stale for legacy records; see
    /// [`SubtreeDeleter`] for the recovery order. A node that is already gone
    /// counts as deleted unless `strict_delete` is configured.
    pub async fn delete_node(&self, node_id: &str, path: &[String]) -> Result<(), ContentTreeError> {
        self.delete_node_traced(node_id, path).await.map(|_| ())
    }

    /// Same as [`Self::delete_node`], returning the states the deletion went through.
    pub async fn delete_node_traced(
        &self,
        node_id: &str,
        path: &[String],
    ) -> Result<DeleteOutcome, ContentTreeError> {
        SubtreeDeleter::new(&self.store, &self.config.layout)
            .strict(self.config.strict_delete)
            .delete(node_id, path)
            .await
            .inspect_err(|err| {
                error!(
                    "event=node_delete module=service status=error node_id={node_id} path={} error={err}",
                    display_path(path)
                );
            })
    }

    /// Counts categories, topics and content leaves over a fresh tree load.
    pub async fn get_content_stats(&self) -> Result<ContentStats, ContentTreeError> {
        let tree = self.get_content_tree().await?;
        Ok(ContentStats::from_tree(&tree))
    }

    /// Loads one node without its children.
    pub async fn get_node(
        &self,
        node_path: &[String],
    ) -> Result<Option<ContentNode>, ContentTreeError> {
        let node_ref = NodeRef::decode(node_path, &self.config.layout)?;
        let path = node_ref.encode(&self.config.layout);
        match self.store.get(&path).await? {
            Some(document) => Ok(Some(to_node(node_ref, document)?)),
            None => Ok(None),
        }
    }

    /// Lists direct children of one node ordered by `order`.
    pub async fn list_children(
        &self,
        parent_path: &[String],
    ) -> Result<Vec<ContentNode>, ContentTreeError> {
        let parent = NodeRef::decode(parent_path, &self.config.layout)?;
        let Some(collection) = parent.child_collection(&self.config.layout) else {
            return Ok(Vec::new());
        };
        let mut children = Vec::new();
        for (id, document) in self.store.list(&collection, Some(ORDER_FIELD)).await? {
            if let Some(child_ref) = parent.child(id) {
                children.push(to_node(child_ref, document)?);
            }
        }
        Ok(children)
    }

    async fn ensure_parent_accepts_children(&self, parent: &NodeRef) -> Result<(), ContentTreeError> {
        let path = parent.encode(&self.config.layout);
        let document = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| ContentTreeError::NotFound(parent.id().to_string()))?;
        let node = to_node(parent.clone(), document)?;
        if let NodeKind::Content { .. } = node.kind {
            return Err(ContentTreeError::ParentIsLeaf(parent.id().to_string()));
        }
        Ok(())
    }

    async fn ensure_childless(&self, node_ref: &NodeRef) -> Result<(), ContentTreeError> {
        let Some(collection) = node_ref.child_collection(&self.config.layout) else {
            return Ok(());
        };
        if self.store.list(&collection, None).await?.is_empty() {
            return Ok(());
        }
        Err(ContentTreeError::HasChildren(node_ref.id().to_string()))
    }

    async fn write_new(
        &self,
        node_ref: &NodeRef,
        data: NewNode,
        title: String,
    ) -> Result<(), ContentTreeError> {
        let path = node_ref.encode(&self.config.layout);
        let document = data.into_document(title, path.clone());
        if matches!(node_ref, NodeRef::Category { .. })
            && document.content.as_deref().is_some_and(|body| !body.is_empty())
        {
            return Err(ContentTreeError::CategoryBody(node_ref.id().to_string()));
        }

        match self.store.set(&path, to_document(&document)?).await {
            Ok(()) => {
                info!(
                    "event=node_create module=service status=ok level={} path={}",
                    node_ref.level().as_str(),
                    display_path(&path)
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=node_create module=service status=error path={} error={err}",
                    display_path(&path)
                );
                Err(err.into())
            }
        }
    }
}

fn normalize_title(value: &str) -> Result<String, ContentTreeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ContentTreeError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

fn ensure_id_matches(expected: &str, node_ref: &NodeRef) -> Result<(), ContentTreeError> {
    if node_ref.id() != expected {
        return Err(ContentTreeError::NodeIdMismatch {
            expected: expected.to_string(),
            found: node_ref.id().to_string(),
        });
    }
    Ok(())
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, ContentTreeError> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        _ => Ok(Document::new()),
    }
}

