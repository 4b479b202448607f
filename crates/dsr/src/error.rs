use dom::{NodeId, TreeError};
use std::fmt;

/// Precondition failures. Range problems are never errors; they surface
/// as unknown offsets or as [`DsrWarning`](crate::DsrWarning)s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DsrError {
    RootNotElement(NodeId),
    /// Removing a marker or merging text was rejected by the tree.
    Tree(TreeError),
}

impl fmt::Display for DsrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DsrError::RootNotElement(id) => write!(f, "DSR root {id} is not an element"),
            DsrError::Tree(err) => write!(f, "tree edit failed: {err}"),
        }
    }
}

impl std::error::Error for DsrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DsrError::Tree(err) => Some(err),
            DsrError::RootNotElement(_) => None,
        }
    }
}

impl From<TreeError> for DsrError {
    fn from(err: TreeError) -> Self {
        DsrError::Tree(err)
    }
}
