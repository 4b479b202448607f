use dom::predicates::TYPEOF;
use dom::{DomSourceRange, NodeData, NodeId, SourceRange, Syntax, TagWidths, Tree};
use dsr::fixup::cleanup_formatting_tags;
use dsr::{DsrOptions, DsrReport, TagTables, compute_dsr};

fn el(tree: &mut Tree, parent: NodeId, name: &str, data: NodeData) -> NodeId {
    let id = tree.create_element_with(name, data);
    tree.append_child(parent, id).unwrap();
    id
}

fn text(tree: &mut Tree, parent: NodeId, s: &str) -> NodeId {
    let id = tree.create_text(s);
    tree.append_child(parent, id).unwrap();
    id
}

fn dsr_of(tree: &Tree, id: NodeId) -> Option<DomSourceRange> {
    tree.data(id).and_then(|dp| dp.dsr)
}

fn compute(tree: &mut Tree, len: i64) -> DsrReport {
    let root = tree.root();
    let report = compute_dsr(tree, root, len, &DsrOptions::default()).unwrap();
    tree.assert_links_consistent();
    report
}

fn literal_html(start: i64, end: i64) -> NodeData {
    NodeData {
        tsr: Some(SourceRange::new(start, end)),
        stx: Some(Syntax::Html),
        ..NodeData::default()
    }
}

#[test]
fn nested_ranges_are_ordered_and_contained() {
    // "== a ==\n*b\n*c"
    let mut tree = Tree::new("body");
    let root = tree.root();
    let h2 = el(&mut tree, root, "h2", NodeData::default());
    text(&mut tree, h2, " a ");
    text(&mut tree, root, "\n");
    let ul = el(&mut tree, root, "ul", NodeData::default());
    let li1 = el(&mut tree, ul, "li", NodeData::default());
    text(&mut tree, li1, "b");
    text(&mut tree, ul, "\n");
    let li2 = el(&mut tree, ul, "li", NodeData::default());
    text(&mut tree, li2, "c");

    let report = compute(&mut tree, 13);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, h2), Some(DomSourceRange::known(0, 7, 2, 2)));
    assert_eq!(dsr_of(&tree, ul), Some(DomSourceRange::known(8, 13, 0, 0)));
    assert_eq!(dsr_of(&tree, li1), Some(DomSourceRange::known(8, 10, 1, 0)));
    assert_eq!(dsr_of(&tree, li2), Some(DomSourceRange::known(11, 13, 1, 0)));

    for id in tree.descendants(root) {
        let Some(DomSourceRange {
            start: Some(s),
            end: Some(e),
            ..
        }) = dsr_of(&tree, id)
        else {
            continue;
        };
        assert!(s <= e, "{} has start {s} past end {e}", tree.node_name(id));
        let parent = tree.parent(id).and_then(|p| dsr_of(&tree, p));
        if let Some(DomSourceRange {
            start: Some(ps),
            end: Some(pe),
            ..
        }) = parent
        {
            assert!(ps <= s && e <= pe, "{} escapes its parent", tree.node_name(id));
        }
    }
}

#[test]
fn comment_width_counts_delimiters_and_escaped_dashes() {
    // "x<!--a--b-->y": the DOM stores the inner dashes entity-escaped.
    let mut tree = Tree::new("body");
    let root = tree.root();
    let p = el(&mut tree, root, "p", NodeData::default());
    text(&mut tree, p, "x");
    let c = tree.create_comment("a&#45;&#45;b");
    tree.append_child(p, c).unwrap();
    text(&mut tree, p, "y");

    let report = compute(&mut tree, 13);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, p), Some(DomSourceRange::known(0, 13, 0, 0)));
}

#[test]
fn propagation_skips_fostered_siblings() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let p = el(&mut tree, root, "p", NodeData::default());
    text(&mut tree, p, "ab");
    let fostered = el(
        &mut tree,
        root,
        "span",
        NodeData {
            fostered: true,
            ..NodeData::default()
        },
    );
    text(&mut tree, fostered, "x");

    let report = compute(&mut tree, 2);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, fostered), Some(DomSourceRange::point(Some(2))));
    assert_eq!(dsr_of(&tree, p), Some(DomSourceRange::known(0, 2, 0, 0)));
}

#[test]
fn tsr_pinned_start_never_passes_the_end() {
    // The trailing text claims the whole source, leaving `b` a cursor of 0
    // while its TSR pins the start at 5.
    let mut tree = Tree::new("body");
    let root = tree.root();
    let b = el(&mut tree, root, "b", NodeData::with_tsr(5, 8));
    text(&mut tree, b, "x");
    text(&mut tree, root, "abcdefghij");

    let report = compute(&mut tree, 10);
    assert_eq!(dsr_of(&tree, b), Some(DomSourceRange::known(5, 5, 3, 3)));
    assert_eq!(report.negative_ranges().count(), 0);
    // Both `b` and `body` see a content start that disagrees with theirs.
    assert_eq!(report.inconsistencies().count(), 2);
    for id in tree.descendants(root) {
        if let Some(DomSourceRange {
            start: Some(s),
            end: Some(e),
            ..
        }) = dsr_of(&tree, id)
        {
            assert!(s <= e, "{} has start {s} past end {e}", tree.node_name(id));
        }
    }
}

#[test]
fn fostered_node_restores_a_clamped_cursor() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let left = el(&mut tree, root, "span", NodeData::default());
    let fostered = el(
        &mut tree,
        root,
        "span",
        NodeData {
            fostered: true,
            ..NodeData::default()
        },
    );
    text(&mut tree, root, "abcdef");

    let report = compute(&mut tree, 2);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, fostered), Some(DomSourceRange::point(Some(0))));
    assert_eq!(
        dsr_of(&tree, left),
        Some(DomSourceRange::new(Some(0), Some(0), None, None))
    );
}

/// span[ "a", param-end meta at 7..8 ], i["y"]: the meta pushes the span's
/// end to 8, past where `i` starts.
fn overrunning_span(i_tsr: bool) -> (Tree, NodeId, NodeId) {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let span = el(
        &mut tree,
        root,
        "span",
        NodeData {
            tag_widths: Some(TagWidths::new(Some(0), Some(0))),
            ..NodeData::default()
        },
    );
    text(&mut tree, span, "a");
    let meta = el(&mut tree, span, "meta", NodeData::with_tsr(7, 8));
    tree.set_attr(meta, TYPEOF, "mw:Param/End").unwrap();
    let i_data = if i_tsr {
        literal_html(4, 6)
    } else {
        NodeData {
            stx: Some(Syntax::Html),
            ..NodeData::default()
        }
    };
    let i = el(&mut tree, root, "i", i_data);
    text(&mut tree, i, "y");
    (tree, span, i)
}

#[test]
fn propagation_keeps_tsr_anchored_starts() {
    let (mut tree, span, i) = overrunning_span(true);
    let report = compute(&mut tree, 10);
    assert_eq!(dsr_of(&tree, span).and_then(|d| d.end), Some(8));
    assert_eq!(
        dsr_of(&tree, i),
        Some(DomSourceRange::new(Some(4), Some(10), Some(2), None))
    );
    // The span's content does not reach back to its start.
    assert_eq!(report.inconsistencies().count(), 1);
}

#[test]
fn propagation_moves_unanchored_starts() {
    let (mut tree, span, i) = overrunning_span(false);
    compute(&mut tree, 10);
    assert_eq!(dsr_of(&tree, span), Some(DomSourceRange::known(0, 8, 0, 0)));
    assert_eq!(
        dsr_of(&tree, i),
        Some(DomSourceRange::new(Some(8), Some(10), None, None))
    );
}

#[test]
fn wikitext_table_learns_end_tag_source() {
    // "{|\n|}"
    let mut tree = Tree::new("body");
    let root = tree.root();
    let table = el(&mut tree, root, "table", NodeData::with_tsr(0, 2));
    text(&mut tree, table, "\n");
    let marker = el(
        &mut tree,
        root,
        "meta",
        NodeData {
            tsr: Some(SourceRange::new(3, 5)),
            end_tag_src: Some("|}".into()),
            ..NodeData::default()
        },
    );
    tree.set_attr(marker, TYPEOF, "mw:EndTag").unwrap();
    tree.set_attr(marker, "data-etag", "table").unwrap();

    let report = compute(&mut tree, 5);
    assert!(report.is_clean(), "{report:?}");
    assert!(!tree.is_attached(marker));
    let dp = tree.data(table).unwrap();
    assert_eq!(dp.end_tag_src.as_deref(), Some("|}"));
    assert_eq!(dp.dsr, Some(DomSourceRange::known(0, 5, 2, 2)));
}

#[test]
fn literal_html_table_keeps_its_own_end_tag_source() {
    // "<table></table>"
    let mut tree = Tree::new("body");
    let root = tree.root();
    let table = el(&mut tree, root, "table", literal_html(0, 7));
    let marker = el(
        &mut tree,
        root,
        "meta",
        NodeData {
            tsr: Some(SourceRange::new(7, 15)),
            end_tag_src: Some("</table>".into()),
            ..NodeData::default()
        },
    );
    tree.set_attr(marker, TYPEOF, "mw:EndTag").unwrap();
    tree.set_attr(marker, "data-etag", "table").unwrap();

    compute(&mut tree, 15);
    let dp = tree.data(table).unwrap();
    assert_eq!(dp.end_tag_src, None);
    assert_eq!(dp.dsr, Some(DomSourceRange::known(0, 15, 7, 8)));
}

#[test]
fn opaque_subtrees_are_not_descended() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let ext = el(
        &mut tree,
        root,
        "span",
        NodeData {
            tsr: Some(SourceRange::new(0, 20)),
            tmp: dom::TmpData {
                native_ext: true,
                ..dom::TmpData::default()
            },
            ..NodeData::default()
        },
    );
    let inner = el(&mut tree, ext, "b", NodeData::default());
    text(&mut tree, inner, "zz");
    let frag = el(&mut tree, root, "div", NodeData::with_tsr(20, 30));
    tree.set_attr(frag, TYPEOF, "mw:DOMFragment").unwrap();
    tree.set_attr(frag, "about", "#mwt2").unwrap();
    let frag_inner = el(&mut tree, frag, "p", NodeData::default());
    text(&mut tree, frag_inner, "fragment");

    let report = compute(&mut tree, 30);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(
        dsr_of(&tree, ext),
        Some(DomSourceRange::new(Some(0), Some(20), None, None))
    );
    assert_eq!(
        dsr_of(&tree, frag),
        Some(DomSourceRange::new(Some(20), Some(30), None, None))
    );
    assert_eq!(dsr_of(&tree, inner), None);
    assert_eq!(dsr_of(&tree, frag_inner), None);
}

#[test]
fn precomputed_widths_shape_the_content_window() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let span = el(
        &mut tree,
        root,
        "span",
        NodeData {
            tag_widths: Some(TagWidths::new(Some(5), Some(6))),
            ..NodeData::default()
        },
    );
    text(&mut tree, span, "ab");

    let report = compute(&mut tree, 13);
    assert!(report.is_clean(), "{report:?}");
    let dp = tree.data(span).unwrap();
    assert_eq!(dp.dsr, Some(DomSourceRange::known(0, 13, 5, 6)));
    assert_eq!(dp.tag_widths, None);
}

#[test]
fn source_offsets_bound_the_root() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    text(&mut tree, root, "abc");
    let options = DsrOptions::default().with_source_offsets(2, 5);
    let report = compute_dsr(&mut tree, root, 40, &options).unwrap();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, root), Some(DomSourceRange::known(2, 5, 0, 0)));
}

#[test]
fn formatting_cleanup_then_ranges() {
    let mut tree = Tree::new("body");
    let root = tree.root();
    let fig = el(&mut tree, root, "figure", NodeData::default());
    tree.set_attr(fig, TYPEOF, "mw:Image/Thumb").unwrap();
    let b = el(&mut tree, fig, "b", NodeData::with_tsr(0, 3));
    let a = el(&mut tree, b, "a", NodeData::default());
    el(&mut tree, a, "img", NodeData::default());
    let cap = el(&mut tree, b, "figcaption", NodeData::default());
    text(&mut tree, cap, "cap");

    cleanup_formatting_tags(&mut tree, root, TagTables::wikitext()).unwrap();
    assert_eq!(tree.parent(b), Some(cap));
    assert_eq!(tree.data(b).and_then(|dp| dp.tsr), None);

    let report = compute(&mut tree, 30);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(dsr_of(&tree, fig), Some(DomSourceRange::known(0, 30, 2, 2)));
    assert_eq!(dsr_of(&tree, root), Some(DomSourceRange::known(0, 30, 0, 0)));
}
