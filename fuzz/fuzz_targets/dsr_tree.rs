#![no_main]

use dom::predicates::TYPEOF;
use dom::{DomSourceRange, NodeData, SourceRange, Syntax, Tree};
use dsr::{DsrOptions, compute_dsr};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 12] = [
    "p", "span", "b", "i", "a", "ul", "li", "table", "tr", "td", "h2", "pre",
];
const TEXTS: [&str; 4] = ["", "a", "b\nc", "  \n"];
const META_TYPES: [&str; 6] = [
    "mw:EndTag",
    "mw:TSRMarker",
    "mw:Transclusion",
    "mw:Transclusion/End",
    "mw:Placeholder/StrippedTag",
    "mw:Entity",
];

/// Interpret bytes as tree-building ops over a stack of open elements.
fn build(data: &[u8]) -> Tree {
    let mut tree = Tree::new("body");
    let mut open = vec![tree.root()];
    let mut bytes = data.iter().copied();
    while let Some(op) = bytes.next() {
        let arg = bytes.next().unwrap_or(0);
        let Some(&parent) = open.last() else {
            break;
        };
        let offset = i64::from(arg);
        match op % 6 {
            0 => {
                let name = NAMES[usize::from(arg) % NAMES.len()];
                let data = NodeData {
                    tsr: (op & 0x10 != 0)
                        .then(|| SourceRange::new(offset, offset + i64::from(op >> 5))),
                    stx: (op & 0x08 != 0).then_some(Syntax::Html),
                    auto_inserted_end: op & 0x40 != 0,
                    fostered: op & 0x80 != 0 && op & 0x20 != 0,
                    ..NodeData::default()
                };
                let id = tree.create_element_with(name, data);
                if tree.append_child(parent, id).is_ok() {
                    open.push(id);
                }
            }
            1 => {
                if open.len() > 1 {
                    open.pop();
                }
            }
            2 => {
                let id = tree.create_text(TEXTS[usize::from(arg) % TEXTS.len()]);
                let _ = tree.append_child(parent, id);
            }
            3 => {
                let id = tree.create_comment("a&#45;&#45;b");
                let _ = tree.append_child(parent, id);
            }
            _ => {
                let ty = META_TYPES[usize::from(arg) % META_TYPES.len()];
                let name = if ty == "mw:Entity" { "span" } else { "meta" };
                let data = NodeData {
                    tsr: (op & 0x10 != 0).then(|| SourceRange::new(offset, offset + 2)),
                    src: (op & 0x20 != 0).then(|| "&amp;".to_string()),
                    name: (op & 0x40 != 0).then(|| "b".to_string()),
                    ..NodeData::default()
                };
                let id = tree.create_element_with(name, data);
                let _ = tree.set_attr(id, TYPEOF, ty);
                let _ = tree.set_attr(id, "data-etag", "b");
                let _ = tree.append_child(parent, id);
            }
        }
    }
    tree
}

fuzz_target!(|data: &[u8]| {
    let mut tree = build(data);
    let root = tree.root();
    let len = data.len() as i64;
    let rt = data.first().is_some_and(|b| b & 1 == 1);
    let options = DsrOptions::default().with_rt_test_mode(rt);
    let report = compute_dsr(&mut tree, root, len, &options);
    assert!(report.is_ok(), "body root must be accepted: {report:?}");
    tree.assert_links_consistent();
    assert_eq!(
        tree.data(root).and_then(|dp| dp.dsr),
        Some(DomSourceRange::known(0, len, 0, 0))
    );
    for id in tree.descendants(root) {
        let Some(dsr) = tree.data(id).and_then(|dp| dp.dsr) else {
            continue;
        };
        if let Some(end) = dsr.end {
            assert!(end >= 0, "negative end stored on {}", tree.node_name(id));
        }
        if let (Some(start), Some(end)) = (dsr.start, dsr.end) {
            assert!(start <= end, "{} starts at {start} past its end {end}", tree.node_name(id));
        }
    }
});
