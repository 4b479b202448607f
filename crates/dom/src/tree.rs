//! Arena-backed annotated tree.
//!
//! Nodes live in a flat `Vec` and are linked with parent/first/last/prev/next
//! handles, so sibling navigation, detaching and replacing are all O(1).
//! Detached nodes stay allocated; they are simply no longer reachable from
//! the root.

use crate::data::{NodeData, Offset};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// ASCII-lowercased tag name.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub data: NodeData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    MissingNode(NodeId),
    InvalidParent(NodeId),
    AlreadyAttached(NodeId),
    NotAttached(NodeId),
    InvalidSibling { parent: NodeId, before: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
    WrongNodeKind(NodeId),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::MissingNode(id) => write!(f, "node {id} does not exist"),
            TreeError::InvalidParent(id) => write!(f, "node {id} cannot have children"),
            TreeError::AlreadyAttached(id) => write!(f, "node {id} already has a parent"),
            TreeError::NotAttached(id) => write!(f, "node {id} has no parent"),
            TreeError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            TreeError::CycleDetected { parent, child } => {
                write!(f, "attaching {child} under {parent} would create a cycle")
            }
            TreeError::WrongNodeKind(id) => write!(f, "node {id} has the wrong kind"),
        }
    }
}

impl std::error::Error for TreeError {}

#[derive(Clone, Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<NodeRecord>,
    root: NodeId,
}

impl Tree {
    /// Create a tree whose root is an element named `root_name`.
    pub fn new(root_name: &str) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.create_element(root_name);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_with(name, NodeData::default())
    }

    pub fn create_element_with(&mut self, name: &str, data: NodeData) -> NodeId {
        self.push(NodeKind::Element(Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            data,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    fn record_mut(&mut self, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id.index())
    }

    fn ensure(&self, id: NodeId) -> Result<&NodeRecord, TreeError> {
        self.record(id).ok_or(TreeError::MissingNode(id))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_rec = self.ensure(parent)?;
        if !matches!(parent_rec.kind, NodeKind::Element(_)) {
            return Err(TreeError::InvalidParent(parent));
        }
        let child_rec = self.ensure(child)?;
        if child_rec.parent.is_some() || child == self.root {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        let old_last = self.nodes[parent.index()].last_child;
        {
            let rec = &mut self.nodes[child.index()];
            rec.parent = Some(parent);
            rec.prev = old_last;
            rec.next = None;
        }
        match old_last {
            Some(last) => self.nodes[last.index()].next = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        if self.ensure(before)?.parent != Some(parent) {
            return Err(TreeError::InvalidSibling { parent, before });
        }
        let prev = self.nodes[before.index()].prev;
        {
            let rec = &mut self.nodes[child.index()];
            rec.parent = Some(parent);
            rec.prev = prev;
            rec.next = Some(before);
        }
        self.nodes[before.index()].prev = Some(child);
        match prev {
            Some(p) => self.nodes[p.index()].next = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        Ok(())
    }

    /// Unlink `id` from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let rec = self.ensure(id)?;
        let Some(parent) = rec.parent else {
            return Err(TreeError::NotAttached(id));
        };
        let (prev, next) = (rec.prev, rec.next);
        match prev {
            Some(p) => self.nodes[p.index()].next = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(n) => self.nodes[n.index()].prev = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }
        let rec = &mut self.nodes[id.index()];
        rec.parent = None;
        rec.prev = None;
        rec.next = None;
        log::trace!(target: "dom.tree", "detached {id} from {parent}");
        Ok(())
    }

    /// Put the unattached `new` where `old` is, detaching `old`.
    pub fn replace_child(&mut self, new: NodeId, old: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.ensure(old)?.parent else {
            return Err(TreeError::NotAttached(old));
        };
        self.insert_before(parent, new, old)?;
        self.detach(old)
    }

    /// Move every child of `from` to `to`, before `before` (or at the end).
    pub fn migrate_children(
        &mut self,
        from: NodeId,
        to: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), TreeError> {
        while let Some(child) = self.first_child(from) {
            self.detach(child)?;
            match before {
                Some(b) => self.insert_before(to, child, b)?,
                None => self.append_child(to, child)?,
            }
        }
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.last_child)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.prev)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.next)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// Attached to the tree (the root counts as attached).
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.record(id).map(|r| &r.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.record_mut(id).map(|r| &mut r.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Comment(_)))
    }

    /// Tag name for elements, `#text` / `#comment` otherwise.
    pub fn node_name(&self, id: NodeId) -> &str {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => &el.name,
            Some(NodeKind::Text(_)) => "#text",
            Some(NodeKind::Comment(_)) => "#comment",
            None => "",
        }
    }

    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.name == name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let el = self.element_mut(id).ok_or(TreeError::WrongNodeKind(id))?;
        match el.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => el.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.element(id).map(|el| &el.data)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.element_mut(id).map(|el| &mut el.data)
    }

    /// Character data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        match self.record_mut(id).map(|r| &mut r.kind) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => {
                *t = text.into();
                Ok(())
            }
            Some(NodeKind::Element(_)) => Err(TreeError::WrongNodeKind(id)),
            None => Err(TreeError::MissingNode(id)),
        }
    }

    /// Concatenated text of all descendant text nodes (document order).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        match self.kind(id) {
            Some(NodeKind::Text(t)) | Some(NodeKind::Comment(t)) => out.push_str(t),
            Some(NodeKind::Element(_)) => {
                let mut stack: Vec<NodeId> = Vec::new();
                let mut cur = self.last_child(id);
                while let Some(c) = cur {
                    stack.push(c);
                    cur = self.prev_sibling(c);
                }
                while let Some(n) = stack.pop() {
                    match self.kind(n) {
                        Some(NodeKind::Text(t)) => out.push_str(t),
                        Some(NodeKind::Element(_)) => {
                            let mut cur = self.last_child(n);
                            while let Some(c) = cur {
                                stack.push(c);
                                cur = self.prev_sibling(c);
                            }
                        }
                        _ => {}
                    }
                }
            }
            None => {}
        }
        out
    }

    /// Character length of a text/comment node's data.
    pub fn char_len(&self, id: NodeId) -> Offset {
        self.text(id).map(char_len).unwrap_or(0)
    }

    /// Preorder walk of the attached subtree rooted at `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            let mut cur = self.last_child(n);
            while let Some(c) = cur {
                stack.push(c);
                cur = self.prev_sibling(c);
            }
        }
        out
    }

    /// Panic if any parent/child/sibling links disagree.
    #[cfg(any(test, feature = "tree-invariants"))]
    pub fn assert_links_consistent(&self) {
        for (i, rec) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            let mut prev = None;
            let mut cur = rec.first_child;
            while let Some(c) = cur {
                let crec = &self.nodes[c.index()];
                assert_eq!(crec.parent, Some(id), "child {c} has wrong parent");
                assert_eq!(crec.prev, prev, "child {c} has wrong prev link");
                prev = Some(c);
                cur = crec.next;
            }
            assert_eq!(rec.last_child, prev, "node {id} has wrong last child");
        }
    }
}

pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.tree.next_sibling(cur);
        Some(cur)
    }
}

/// Length in source character units.
pub fn char_len(s: &str) -> Offset {
    s.chars().count() as Offset
}
