//! Path codec for the three-level content tree.
//!
//! # Responsibility
//! - Encode typed node references into alternating collection/id segments.
//! - Decode wire paths back into typed references and reject malformed ones.
//!
//! # Invariants
//! - Node paths always have length 2, 4 or 6.
//! - Even positions hold collection names, odd positions hold document ids.
//! - Position 0 is the root collection; positions 2 and 4 are the child collection.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default collection holding root categories.
pub const DEFAULT_ROOT_COLLECTION: &str = "categories";
/// Default collection name used under every non-leaf node.
pub const DEFAULT_CHILD_COLLECTION: &str = "children";

/// Collection names used to build store paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionLayout {
    pub root_collection: String,
    pub child_collection: String,
}

impl Default for CollectionLayout {
    fn default() -> Self {
        Self {
            root_collection: DEFAULT_ROOT_COLLECTION.to_string(),
            child_collection: DEFAULT_CHILD_COLLECTION.to_string(),
        }
    }
}

impl CollectionLayout {
    /// Collection path of the root categories (`[root]`).
    pub fn root_path(&self) -> Vec<String> {
        vec![self.root_collection.clone()]
    }
}

/// Depth of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeLevel {
    Category,
    Topic,
    Content,
}

impl NodeLevel {
    /// Classifies a node path by its length. Returns `None` for any length
    /// other than 2, 4 or 6.
    pub fn from_path_len(len: usize) -> Option<Self> {
        match len {
            2 => Some(Self::Category),
            4 => Some(Self::Topic),
            6 => Some(Self::Content),
            _ => None,
        }
    }

    /// Number of segments in a path addressing a node of this level.
    pub fn path_len(self) -> usize {
        match self {
            Self::Category => 2,
            Self::Topic => 4,
            Self::Content => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Topic => "topic",
            Self::Content => "content",
        }
    }
}

/// Typed address of one node in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Category {
        id: String,
    },
    Topic {
        category_id: String,
        id: String,
    },
    Content {
        category_id: String,
        topic_id: String,
        id: String,
    },
}

impl NodeRef {
    pub fn category(id: impl Into<String>) -> Self {
        Self::Category { id: id.into() }
    }

    pub fn topic(category_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Topic {
            category_id: category_id.into(),
            id: id.into(),
        }
    }

    pub fn content(
        category_id: impl Into<String>,
        topic_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::Content {
            category_id: category_id.into(),
            topic_id: topic_id.into(),
            id: id.into(),
        }
    }

    /// Document id of the referenced node.
    pub fn id(&self) -> &str {
        match self {
            Self::Category { id } | Self::Topic { id, .. } | Self::Content { id, .. } => id,
        }
    }

    pub fn level(&self) -> NodeLevel {
        match self {
            Self::Category { .. } => NodeLevel::Category,
            Self::Topic { .. } => NodeLevel::Topic,
            Self::Content { .. } => NodeLevel::Content,
        }
    }

    /// Builds the reference of a child with `id` under this node.
    ///
    /// Content nodes are leaves and have no children.
    pub fn child(&self, id: impl Into<String>) -> Option<NodeRef> {
        match self {
            Self::Category { id: category_id } => Some(Self::topic(category_id.clone(), id)),
            Self::Topic { category_id, id: topic_id } => {
                Some(Self::content(category_id.clone(), topic_id.clone(), id))
            }
            Self::Content { .. } => None,
        }
    }

    /// Encodes this reference into wire path segments.
    pub fn encode(&self, layout: &CollectionLayout) -> Vec<String> {
        let root = layout.root_collection.clone();
        let child = layout.child_collection.clone();
        match self {
            Self::Category { id } => vec![root, id.clone()],
            Self::Topic { category_id, id } => {
                vec![root, category_id.clone(), child, id.clone()]
            }
            Self::Content {
                category_id,
                topic_id,
                id,
            } => vec![
                root,
                category_id.clone(),
                child.clone(),
                topic_id.clone(),
                child,
                id.clone(),
            ],
        }
    }

    /// Decodes wire path segments into a typed reference.
    pub fn decode(path: &[String], layout: &CollectionLayout) -> Result<Self, PathError> {
        NodeLevel::from_path_len(path.len()).ok_or(PathError::InvalidLength(path.len()))?;
        validate_segments(path, layout)?;
        Ok(match path.len() {
            2 => Self::category(path[1].clone()),
            4 => Self::topic(path[1].clone(), path[3].clone()),
            _ => Self::content(path[1].clone(), path[3].clone(), path[5].clone()),
        })
    }

    /// Collection path holding this node's children (length 3 or 5).
    pub fn child_collection(&self, layout: &CollectionLayout) -> Option<Vec<String>> {
        if self.level() == NodeLevel::Content {
            return None;
        }
        let mut path = self.encode(layout);
        path.push(layout.child_collection.clone());
        Some(path)
    }

    /// Collection path holding this node itself (length 1, 3 or 5).
    pub fn parent_collection(&self, layout: &CollectionLayout) -> Vec<String> {
        let mut path = self.encode(layout);
        path.pop();
        path
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category { id } => write!(f, "{id}"),
            Self::Topic { category_id, id } => write!(f, "{category_id}/{id}"),
            Self::Content {
                category_id,
                topic_id,
                id,
            } => write!(f, "{category_id}/{topic_id}/{id}"),
        }
    }
}

/// Parent reference resolved from a child collection path (length 3 or 5).
pub fn parent_of_collection(
    collection: &[String],
    layout: &CollectionLayout,
) -> Result<NodeRef, PathError> {
    match collection.len() {
        3 | 5 => {
            let (last, parent) = collection
                .split_last()
                .ok_or(PathError::InvalidLength(0))?;
            if *last != layout.child_collection {
                return Err(PathError::UnexpectedCollection {
                    position: collection.len() - 1,
                    expected: layout.child_collection.clone(),
                    found: last.clone(),
                });
            }
            NodeRef::decode(parent, layout)
        }
        other => Err(PathError::InvalidLength(other)),
    }
}

/// Renders segments as `a/b/c` for log lines and error messages.
pub fn display_path(path: &[String]) -> String {
    path.join("/")
}

fn validate_segments(path: &[String], layout: &CollectionLayout) -> Result<(), PathError> {
    for (position, segment) in path.iter().enumerate() {
        if segment.trim().is_empty() {
            return Err(PathError::EmptySegment(position));
        }
        let expected = match position {
            0 => &layout.root_collection,
            2 | 4 => &layout.child_collection,
            _ => continue,
        };
        if segment != expected {
            return Err(PathError::UnexpectedCollection {
                position,
                expected: expected.clone(),
                found: segment.clone(),
            });
        }
    }
    Ok(())
}

/// Errors from decoding wire paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path length is outside the allowed set.
    InvalidLength(usize),
    /// Segment at position is blank.
    EmptySegment(usize),
    /// Collection segment does not match the configured layout.
    UnexpectedCollection {
        position: usize,
        expected: String,
        found: String,
    },
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(f, "invalid path length {len}"),
            Self::EmptySegment(position) => write!(f, "empty path segment at position {position}"),
            Self::UnexpectedCollection {
                position,
                expected,
                found,
            } => write!(
                f,
                "expected collection `{expected}` at position {position}, found `{found}`"
            ),
        }
    }
}

impl Error for PathError {}
