//! Content node domain model.
//!
//! # Responsibility
//! - Define the typed category/topic/content read model.
//! - Define the stored document shape and create/update inputs.
//!
//! # Invariants
//! - A category is never a leaf, even when its stored document carries a body.
//! - Only content nodes carry a body, and content nodes never carry children.
//! - `children` is populated only by a tree load.

use crate::model::path::{CollectionLayout, NodeLevel, NodeRef};
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of a node, carrying only the fields that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Category,
    Topic,
    /// Leaf node with a non-empty body.
    Content { body: String },
}

/// Read model for one node of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    /// Location of the node in the store. Fixed at creation.
    pub node_ref: NodeRef,
    pub title: String,
    pub icon: Option<String>,
    pub color_hex: Option<String>,
    /// Sort key among siblings.
    pub order: f64,
    pub kind: NodeKind,
    /// `None` until a tree load fills it, or when the child read failed.
    pub children: Option<Vec<ContentNode>>,
}

impl ContentNode {
    /// Builds a node from a stored document found at `node_ref`.
    pub fn from_document(node_ref: NodeRef, document: NodeDocument) -> Self {
        let kind = match (node_ref.level(), document.content) {
            (NodeLevel::Category, _) => NodeKind::Category,
            (_, Some(body)) if !body.is_empty() => NodeKind::Content { body },
            _ => NodeKind::Topic,
        };
        Self {
            node_ref,
            title: document.title,
            icon: document.icon,
            color_hex: document.color_hex,
            order: document.order,
            kind,
            children: None,
        }
    }

    pub fn id(&self) -> &str {
        self.node_ref.id()
    }

    /// Wire path of this node.
    pub fn path(&self, layout: &CollectionLayout) -> Vec<String> {
        self.node_ref.encode(layout)
    }

    /// Body text for content nodes.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Content { body } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Content { .. })
    }
}

/// Stored document shape.
///
/// Field names follow the store's camelCase schema. `path` is absent on
/// records written before path tracking existed. A null `title` or `order`
/// reads as the default, and `order` accepts any JSON number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Input for creating a node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub title: String,
    pub content: Option<String>,
    pub icon: Option<String>,
    pub color_hex: Option<String>,
    /// Defaults to 0 when unspecified.
    pub order: Option<f64>,
}

impl NewNode {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<f64>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub(crate) fn into_document(self, title: String, path: Vec<String>) -> NodeDocument {
        NodeDocument {
            title,
            content: self.content,
            icon: self.icon,
            color_hex: self.color_hex,
            order: self.order.unwrap_or(0.0),
            path: Some(path),
        }
    }
}

/// Partial update applied to an existing node. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl NodePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.icon.is_none()
            && self.color_hex.is_none()
    }
}

/// Node counts per kind over an assembled tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub total_categories: usize,
    pub total_topics: usize,
    pub total_content: usize,
}

impl ContentStats {
    /// Counts every node of `tree`, descending into loaded children.
    pub fn from_tree(tree: &[ContentNode]) -> Self {
        let mut stats = Self::default();
        stats.accumulate(tree);
        stats
    }

    fn accumulate(&mut self, nodes: &[ContentNode]) {
        for node in nodes {
            match node.kind {
                NodeKind::Category => self.total_categories += 1,
                NodeKind::Content { .. } => self.total_content += 1,
                NodeKind::Topic => self.total_topics += 1,
            }
            if let Some(children) = &node.children {
                self.accumulate(children);
            }
        }
    }
}
