//! Opening/closing syntax widths for tags whose width no TSR gives directly.
//!
//! Widths that cannot be determined stay `None`; propagation resolves them
//! later rather than guessing here.

use crate::tables::TagTables;
use dom::predicates::{
    has_expanded_attrs_type, uses_ext_link_syntax, uses_url_link_syntax, uses_wiki_link_syntax,
};
use dom::{NodeData, NodeId, Offset, Syntax, TagWidths, Tree, char_len};

/// Width of a list item's bullet run: its list nesting depth.
///
/// The head item of a nested-list chain (first child whose own first child
/// is a list) contributes no width of its own.
pub fn list_item_width(tree: &Tree, tables: &TagTables, item: NodeId) -> Offset {
    if tree.prev_sibling(item).is_none()
        && tree
            .first_child(item)
            .is_some_and(|c| tables.is_list(tree.node_name(c)))
    {
        return 0;
    }

    let mut depth = 0;
    let mut cur = Some(item);
    while let Some(li) = cur.filter(|&n| tables.is_list_item(tree.node_name(n))) {
        depth += 1;
        cur = tree.parent(li).and_then(|list| tree.parent(list));
    }
    depth
}

/// Widths for link syntaxes:
///
/// - `[[Foo|bar]]` piped wikilink: `[[Foo|` and `]]`
/// - `[[Foo]]` simple wikilink: `[[` and `]]`
/// - `[http://x.org foo]` external link: `[http://x.org ` and `]`
/// - bare URL or magic link: no brackets at all
///
/// A piped link whose target came from expansion has no stored href that
/// corresponds to source, so its width is unknown.
pub fn link_width(tree: &Tree, node: NodeId, dp: Option<&NodeData>) -> Option<(Offset, Offset)> {
    let dp = dp?;
    if uses_wiki_link_syntax(tree, node, dp) && !has_expanded_attrs_type(tree, node) {
        if dp.stx == Some(Syntax::Piped) {
            dp.stored_href().map(|href| (char_len(href) + 3, 2))
        } else {
            Some((2, 2))
        }
    } else if let Some(tsr) = dp.tsr.filter(|_| uses_ext_link_syntax(tree, node, dp)) {
        dp.target_offset.map(|off| (off - tsr.start, 1))
    } else if uses_url_link_syntax(tree, node, dp) {
        Some((0, 0))
    } else {
        None
    }
}

/// Resolve `node`'s tag widths starting from `prior` (open width from its
/// TSR, close width from a preceding end-tag marker).
///
/// Precomputed `tag_widths` win and are consumed, so a second pass falls
/// back to the same table-driven computation.
pub fn tag_widths(tree: &mut Tree, tables: &TagTables, prior: TagWidths, node: NodeId) -> TagWidths {
    if let Some(precomputed) = tree.data_mut(node).and_then(|dp| dp.tag_widths.take()) {
        return precomputed;
    }

    let tree = &*tree;
    let dp = tree.data(node);
    let mut open = prior.open;
    let mut close = prior.close;

    if dp.is_some_and(NodeData::has_literal_html_marker) {
        if dp.is_some_and(|dp| dp.self_close) {
            close = Some(0);
        }
        return TagWidths::new(open, close);
    }

    let name = tree.node_name(node);
    // Rows not present in source (no `|-`) have zero width.
    if name == "tr" && dp.is_none_or(|dp| dp.start_tag_src.is_none()) {
        return TagWidths::new(Some(0), Some(0));
    }

    let mut defaults = tables.default_widths(name);
    if open.is_none() {
        if name == "a" {
            defaults = link_width(tree, node, dp).map(|(o, c)| TagWidths::new(Some(o), Some(c)));
            open = defaults.and_then(|d| d.open);
        } else if tables.is_list_item(name) {
            open = Some(list_item_width(tree, tables, node));
        } else if let Some(d) = defaults {
            open = d.open;
        }
    }
    if close.is_none() {
        close = defaults.and_then(|d| d.close);
    }
    TagWidths::new(open, close)
}
