//! Structural predicates over annotated nodes.
//!
//! Type information travels in the conventional `typeof`, `rel`, `about` and
//! `property` attributes as whitespace-separated `mw:` tokens.

use crate::data::{NodeData, Syntax};
use crate::entities::decoded_comment_len;
use crate::tree::{NodeId, Tree};
use crate::Offset;

pub const TYPEOF: &str = "typeof";

fn has_token(value: Option<&str>, pred: impl Fn(&str) -> bool) -> bool {
    value.is_some_and(|v| v.split_whitespace().any(pred))
}

/// `typeof` contains exactly the token `ty`.
pub fn has_type(tree: &Tree, id: NodeId, ty: &str) -> bool {
    has_token(tree.attr(id, TYPEOF), |t| t == ty)
}

pub fn is_node_of_type(tree: &Tree, id: NodeId, name: &str, ty: &str) -> bool {
    tree.is_named(id, name) && tree.attr(id, TYPEOF) == Some(ty)
}

pub fn is_end_tag_marker(tree: &Tree, id: NodeId) -> bool {
    is_node_of_type(tree, id, "meta", "mw:EndTag")
}

pub fn is_tsr_marker(tree: &Tree, id: NodeId) -> bool {
    is_node_of_type(tree, id, "meta", "mw:TSRMarker")
}

fn tpl_meta_token(t: &str) -> bool {
    let base = t.strip_suffix("/End").unwrap_or(t);
    base == "mw:Transclusion" || base == "mw:Param"
}

/// `typeof` marks a template or parameter expansion boundary.
pub fn is_tpl_meta_type(ty: Option<&str>) -> bool {
    has_token(ty, tpl_meta_token)
}

/// A `meta` opening a template expansion (not its `/End`).
pub fn is_tpl_start_marker_meta(tree: &Tree, id: NodeId) -> bool {
    if !tree.is_named(id, "meta") {
        return false;
    }
    let ty = tree.attr(id, TYPEOF);
    is_tpl_meta_type(ty) && !has_token(ty, |t| t.ends_with("/End"))
}

/// `typeof` is exactly `mw:Placeholder` or `mw:Placeholder/<word>`.
pub fn is_placeholder_type(ty: Option<&str>) -> bool {
    let Some(ty) = ty else {
        return false;
    };
    match ty.strip_prefix("mw:Placeholder") {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('/')
            .is_some_and(|w| w.chars().all(|c| c.is_alphanumeric() || c == '_')),
        None => false,
    }
}

pub fn is_stripped_tag_placeholder(tree: &Tree, id: NodeId) -> bool {
    has_type(tree, id, "mw:Placeholder/StrippedTag")
}

pub fn is_entity(tree: &Tree, id: NodeId) -> bool {
    tree.attr(id, TYPEOF) == Some("mw:Entity")
}

pub fn has_object_attr_property(tree: &Tree, id: NodeId) -> bool {
    tree.attr(id, "property")
        .is_some_and(|p| p.contains("mw:objectAttr"))
}

pub fn has_expanded_attrs_type(tree: &Tree, id: NodeId) -> bool {
    has_token(tree.attr(id, TYPEOF), |t| {
        t == "mw:ExpandedAttrs" || t.starts_with("mw:ExpandedAttrs/")
    })
}

fn has_fragment_type(tree: &Tree, id: NodeId) -> bool {
    has_type(tree, id, "mw:DOMFragment")
}

/// Wrapper carrying externally sourced content: typed `mw:DOMFragment`, or
/// sharing its `about` id with a preceding fragment wrapper.
pub fn is_dom_fragment_wrapper(tree: &Tree, id: NodeId) -> bool {
    if !tree.is_element(id) {
        return false;
    }
    let Some(about) = tree.attr(id, "about").filter(|a| !a.is_empty()) else {
        return false;
    };
    has_fragment_type(tree, id)
        || tree.prev_sibling(id).is_some_and(|prev| {
            tree.is_element(prev)
                && tree.attr(prev, "about") == Some(about)
                && has_fragment_type(tree, prev)
        })
}

pub fn is_nowiki_span(tree: &Tree, id: NodeId) -> bool {
    is_node_of_type(tree, id, "span", "mw:Nowiki")
}

pub fn is_generated_figure(tree: &Tree, id: NodeId) -> bool {
    has_token(tree.attr(id, TYPEOF), |t| {
        ["mw:Image", "mw:Video", "mw:Audio"]
            .iter()
            .any(|m| t == *m || t.strip_prefix(*m).is_some_and(|r| r.starts_with('/')))
    })
}

/// `[[...]]` syntax.
pub fn uses_wiki_link_syntax(tree: &Tree, id: NodeId, dp: &NodeData) -> bool {
    tree.attr(id, "rel") == Some("mw:WikiLink") || dp.stx.is_some_and(|s| !s.is_url_like())
}

/// `[url text]` syntax.
pub fn uses_ext_link_syntax(tree: &Tree, id: NodeId, dp: &NodeData) -> bool {
    tree.attr(id, "rel") == Some("mw:ExtLink") && !dp.stx.is_some_and(Syntax::is_url_like)
}

/// Bare URL or magic link, no bracket syntax at all.
pub fn uses_url_link_syntax(tree: &Tree, id: NodeId, dp: &NodeData) -> bool {
    tree.attr(id, "rel") == Some("mw:ExtLink") && dp.stx.is_some_and(Syntax::is_url_like)
}

pub fn is_literal_html_node(tree: &Tree, id: NodeId) -> bool {
    tree.data(id).is_some_and(NodeData::has_literal_html_marker)
}

/// A `pre` produced by line-initial indentation rather than a literal tag.
pub fn is_indent_pre(tree: &Tree, id: NodeId) -> bool {
    tree.is_named(id, "pre") && !is_literal_html_node(tree, id)
}

/// Extra source characters an indent-pre text node accounts for: one
/// leading space per line after the first. The trailing newline of the last
/// child closes the block and adds nothing.
pub fn indent_pre_correction(tree: &Tree, text_node: NodeId) -> Offset {
    let Some(parent) = tree.parent(text_node) else {
        return 0;
    };
    if !is_indent_pre(tree, parent) {
        return 0;
    }
    let Some(text) = tree.text(text_node) else {
        return 0;
    };
    let bytes = text.as_bytes();
    let mut count = memchr::memchr_iter(b'\n', bytes).count();
    if tree.last_child(parent) == Some(text_node) && bytes.last() == Some(&b'\n') {
        count -= 1;
    }
    count as Offset
}

/// Source width of a text node, indent-pre correction included.
pub fn text_source_len(tree: &Tree, id: NodeId) -> Offset {
    tree.char_len(id) + indent_pre_correction(tree, id)
}

/// Source width of a comment node, delimiters included.
pub fn comment_source_len(tree: &Tree, id: NodeId) -> Offset {
    tree.text(id).map(decoded_comment_len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(tree: &mut Tree, ty: &str) -> NodeId {
        let root = tree.root();
        let m = tree.create_element("meta");
        tree.set_attr(m, TYPEOF, ty).unwrap();
        tree.append_child(root, m).unwrap();
        m
    }

    #[test]
    fn template_markers() {
        let mut tree = Tree::new("body");
        let start = meta(&mut tree, "mw:Transclusion");
        let end = meta(&mut tree, "mw:Transclusion/End");
        let param = meta(&mut tree, "foo mw:Param");
        assert!(is_tpl_start_marker_meta(&tree, start));
        assert!(!is_tpl_start_marker_meta(&tree, end));
        assert!(is_tpl_meta_type(tree.attr(end, TYPEOF)));
        assert!(is_tpl_start_marker_meta(&tree, param));
        assert!(!is_tpl_meta_type(Some("mw:TransclusionX")));
    }

    #[test]
    fn placeholder_type_matches_whole_value() {
        assert!(is_placeholder_type(Some("mw:Placeholder")));
        assert!(is_placeholder_type(Some("mw:Placeholder/StrippedTag")));
        assert!(!is_placeholder_type(Some("mw:Placeholder/a b")));
        assert!(!is_placeholder_type(Some("x mw:Placeholder")));
        assert!(!is_placeholder_type(None));
    }

    #[test]
    fn link_syntax_discrimination() {
        let mut tree = Tree::new("body");
        let a = tree.create_element("a");
        tree.set_attr(a, "rel", "mw:ExtLink").unwrap();
        let url = NodeData {
            stx: Some(Syntax::Url),
            ..NodeData::default()
        };
        let bracketed = NodeData::default();
        assert!(uses_url_link_syntax(&tree, a, &url));
        assert!(!uses_ext_link_syntax(&tree, a, &url));
        assert!(!uses_wiki_link_syntax(&tree, a, &url));
        assert!(uses_ext_link_syntax(&tree, a, &bracketed));
        let simple = NodeData {
            stx: Some(Syntax::Simple),
            ..NodeData::default()
        };
        assert!(uses_wiki_link_syntax(&tree, a, &simple));
    }

    #[test]
    fn fragment_wrapper_siblings_share_about() {
        let mut tree = Tree::new("body");
        let root = tree.root();
        let first = tree.create_element("span");
        tree.set_attr(first, "about", "#mwt1").unwrap();
        tree.set_attr(first, TYPEOF, "mw:DOMFragment").unwrap();
        let second = tree.create_element("p");
        tree.set_attr(second, "about", "#mwt1").unwrap();
        let other = tree.create_element("p");
        tree.append_child(root, first).unwrap();
        tree.append_child(root, second).unwrap();
        tree.append_child(root, other).unwrap();
        assert!(is_dom_fragment_wrapper(&tree, first));
        assert!(is_dom_fragment_wrapper(&tree, second));
        assert!(!is_dom_fragment_wrapper(&tree, other));
    }

    #[test]
    fn indent_pre_correction_skips_closing_newline() {
        let mut tree = Tree::new("body");
        let root = tree.root();
        let pre = tree.create_element("pre");
        let t1 = tree.create_text("a\nb\n");
        tree.append_child(root, pre).unwrap();
        tree.append_child(pre, t1).unwrap();
        assert_eq!(indent_pre_correction(&tree, t1), 1);
        let t2 = tree.create_text("c\n");
        tree.insert_before(pre, t2, t1).unwrap();
        assert_eq!(indent_pre_correction(&tree, t2), 1);

        let html_pre = tree.create_element_with(
            "pre",
            NodeData {
                stx: Some(Syntax::Html),
                ..NodeData::default()
            },
        );
        let t3 = tree.create_text("x\ny");
        tree.append_child(root, html_pre).unwrap();
        tree.append_child(html_pre, t3).unwrap();
        assert_eq!(indent_pre_correction(&tree, t3), 0);
    }

    #[test]
    fn generated_figure_types() {
        let mut tree = Tree::new("body");
        let fig = tree.create_element("figure");
        tree.set_attr(fig, TYPEOF, "mw:Image/Thumb").unwrap();
        let span = tree.create_element("span");
        tree.set_attr(span, TYPEOF, "mw:Images").unwrap();
        assert!(is_generated_figure(&tree, fig));
        assert!(!is_generated_figure(&tree, span));
    }
}
