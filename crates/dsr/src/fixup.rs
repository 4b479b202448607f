//! Formatting wrappers around generated media.
//!
//! `'''[[File:X.jpg|thumb|caption]]'''` leaves a chain of formatting
//! elements wrapped around the figure's link and caption. Bolding an image
//! means nothing, so the chain is moved onto the caption text, or dropped
//! when there is no caption. Run before [`compute_dsr`](crate::compute_dsr).

use crate::tables::TagTables;
use dom::predicates::is_generated_figure;
use dom::{NodeId, Tree, TreeError};

pub fn cleanup_formatting_tags(
    tree: &mut Tree,
    root: NodeId,
    tables: &TagTables,
) -> Result<(), TreeError> {
    let mut parents = vec![root];
    while let Some(parent) = parents.pop() {
        let children: Vec<NodeId> = tree.children(parent).collect();
        for child in children {
            if is_generated_figure(tree, child) {
                fix_figure(tree, child, tables)?;
            } else if tree.is_element(child) {
                parents.push(child);
            }
        }
    }
    Ok(())
}

fn fix_figure(tree: &mut Tree, fig: NodeId, tables: &TagTables) -> Result<(), TreeError> {
    // `a` is a formatting element too but ends the chain.
    let mut path = Vec::new();
    let mut cur = tree.first_child(fig);
    while let Some(n) = cur {
        let name = tree.node_name(n);
        if !tables.is_formatting(name) || name == "a" || tree.next_sibling(n).is_some() {
            break;
        }
        path.push(n);
        cur = tree.first_child(n);
    }
    let (Some(&head), Some(&tail)) = (path.first(), path.last()) else {
        return Ok(());
    };
    let Some(anchor) = tree.first_child(tail).filter(|&a| tree.is_named(a, "a")) else {
        return Ok(());
    };
    let Some(maybe_caption) = tree.last_child(tail) else {
        return Ok(());
    };

    tree.migrate_children(tail, fig, None)?;
    if tree.is_named(maybe_caption, "figcaption") {
        tree.migrate_children(maybe_caption, tail, None)?;
        tree.detach(head)?;
        tree.append_child(maybe_caption, head)?;
        // The displaced wrappers' TSRs no longer describe where they sit.
        for &n in &path {
            if let Some(dp) = tree.data_mut(n) {
                dp.tsr = None;
            }
        }
        log::trace!(target: "dsr.fixup", "moved {} formatting wrappers into caption of {fig}", path.len());
    } else if maybe_caption == anchor {
        while let Some(n) = path.pop() {
            tree.detach(n)?;
        }
        log::trace!(target: "dsr.fixup", "dropped formatting wrappers around {fig}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::predicates::TYPEOF;
    use dom::{NodeData, snapshot};

    fn figure(tree: &mut Tree) -> NodeId {
        let root = tree.root();
        let fig = tree.create_element("figure");
        tree.set_attr(fig, TYPEOF, "mw:Image/Thumb").unwrap();
        tree.append_child(root, fig).unwrap();
        fig
    }

    fn add(tree: &mut Tree, parent: NodeId, name: &str) -> NodeId {
        let n = tree.create_element_with(name, NodeData::with_tsr(0, 3));
        tree.append_child(parent, n).unwrap();
        n
    }

    #[test]
    fn wrappers_move_into_caption() {
        let mut tree = Tree::new("body");
        let fig = figure(&mut tree);
        let b = add(&mut tree, fig, "b");
        let a = add(&mut tree, b, "a");
        add(&mut tree, a, "img");
        let cap = add(&mut tree, b, "figcaption");
        let t = tree.create_text("cap");
        tree.append_child(cap, t).unwrap();

        let root = tree.root();
        cleanup_formatting_tags(&mut tree, root, TagTables::wikitext()).unwrap();
        assert_eq!(
            snapshot::render_lines(&tree, fig),
            vec![
                "<figure typeof=\"mw:Image/Thumb\">",
                "  <a>",
                "    <img>",
                "  <figcaption>",
                "    <b>",
                "      \"cap\"",
            ]
        );
        assert_eq!(tree.data(b).unwrap().tsr, None);
        tree.assert_links_consistent();
    }

    #[test]
    fn wrappers_around_bare_link_are_dropped() {
        let mut tree = Tree::new("body");
        let fig = figure(&mut tree);
        let small = add(&mut tree, fig, "small");
        let i = add(&mut tree, small, "i");
        let a = add(&mut tree, i, "a");
        add(&mut tree, a, "img");

        let root = tree.root();
        cleanup_formatting_tags(&mut tree, root, TagTables::wikitext()).unwrap();
        assert_eq!(tree.children(fig).collect::<Vec<_>>(), vec![a]);
        assert!(!tree.is_attached(small));
        assert!(!tree.is_attached(i));
    }

    #[test]
    fn figures_are_found_below_the_root_only_once() {
        let mut tree = Tree::new("body");
        let root = tree.root();
        let div = add(&mut tree, root, "div");
        let fig = tree.create_element("figure");
        tree.set_attr(fig, TYPEOF, "mw:Image").unwrap();
        tree.append_child(div, fig).unwrap();
        let u = add(&mut tree, fig, "u");
        let a = add(&mut tree, u, "a");
        let extra = add(&mut tree, fig, "span");

        cleanup_formatting_tags(&mut tree, root, TagTables::wikitext()).unwrap();
        // `u` has a sibling, so it is not a wrapper chain.
        assert_eq!(tree.children(fig).collect::<Vec<_>>(), vec![u, extra]);
        assert_eq!(tree.parent(a), Some(u));
    }
}
