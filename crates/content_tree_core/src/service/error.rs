//! Errors surfaced by content tree use-cases.

use crate::model::path::PathError;
use crate::repo::document_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from content tree service operations.
#[derive(Debug)]
pub enum ContentTreeError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Supplied path does not address a node of an allowed level.
    InvalidPath(PathError),
    /// Supplied path does not end with the supplied node id.
    NodeIdMismatch { expected: String, found: String },
    /// Categories never carry a body.
    CategoryBody(String),
    /// Parent carries a body and cannot hold children.
    ParentIsLeaf(String),
    /// Node still has children and cannot take a body.
    HasChildren(String),
    /// Delete target could not be resolved by any strategy.
    NotFound(String),
    /// Repository-level failure.
    Store(StoreError),
}

impl ContentTreeError {
    /// Whether the caller supplied invalid input, as opposed to a store or lookup failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTitle
                | Self::InvalidPath(_)
                | Self::NodeIdMismatch { .. }
                | Self::CategoryBody(_)
                | Self::ParentIsLeaf(_)
                | Self::HasChildren(_)
        )
    }
}

impl Display for ContentTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::InvalidPath(err) => write!(f, "invalid node path: {err}"),
            Self::NodeIdMismatch { expected, found } => {
                write!(f, "path addresses node `{found}`, expected `{expected}`")
            }
            Self::CategoryBody(id) => write!(f, "category cannot hold content: {id}"),
            Self::ParentIsLeaf(id) => write!(f, "content node cannot hold children: {id}"),
            Self::HasChildren(id) => write!(f, "node with children cannot hold content: {id}"),
            Self::NotFound(id) => write!(f, "content node not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContentTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for ContentTreeError {
    fn from(value: PathError) -> Self {
        Self::InvalidPath(value)
    }
}

impl From<StoreError> for ContentTreeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for ContentTreeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(value))
    }
}
