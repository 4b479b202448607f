//! Annotated markup tree.
//!
//! A mutable element/text/comment tree whose elements carry structured
//! source metadata ([`NodeData`]) attached by the tokenizer and tree builder
//! and later extended by downstream passes.

pub mod data;
pub mod entities;
pub mod predicates;
pub mod snapshot;
mod tree;

pub use crate::data::{
    DomSourceRange, NodeData, Offset, SourceRange, Syntax, TagWidths, TmpData,
};
pub use crate::tree::{Children, Element, NodeId, NodeKind, Tree, TreeError, char_len};
