//! Deterministic one-line-per-node rendering of a tree and its source ranges.
//! Intended for golden test comparisons, not a stable format.

use crate::data::{DomSourceRange, Offset};
use crate::tree::{NodeId, NodeKind, Tree};
use std::fmt::Write;

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

fn push_opt(out: &mut String, v: Option<Offset>) {
    match v {
        Some(v) => {
            let _ = write!(out, "{v}");
        }
        None => out.push_str("null"),
    }
}

/// `[start,end,open,close]`, or `[start,end]` when both widths are unknown.
pub fn format_dsr(dsr: &DomSourceRange) -> String {
    let mut out = String::with_capacity(16);
    out.push('[');
    push_opt(&mut out, dsr.start);
    out.push(',');
    push_opt(&mut out, dsr.end);
    if dsr.open_width.is_some() || dsr.close_width.is_some() {
        out.push(',');
        push_opt(&mut out, dsr.open_width);
        out.push(',');
        push_opt(&mut out, dsr.close_width);
    }
    out.push(']');
    out
}

fn push_preview(out: &mut String, s: &str) {
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            out.push('…');
            break;
        }
        match ch {
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
}

/// Render the attached subtree under `root`.
pub fn render_lines(tree: &Tree, root: NodeId) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        let mut line = INDENT_STEP.repeat(depth);
        match tree.kind(id) {
            Some(NodeKind::Element(el)) => {
                line.push('<');
                line.push_str(&el.name);
                if let Some(ty) = tree.attr(id, "typeof") {
                    line.push_str(" typeof=\"");
                    line.push_str(ty);
                    line.push('"');
                }
                line.push('>');
                if let Some(dsr) = &el.data.dsr {
                    line.push_str(" dsr=");
                    line.push_str(&format_dsr(dsr));
                }
                let mut cur = tree.last_child(id);
                while let Some(c) = cur {
                    stack.push((c, depth + 1));
                    cur = tree.prev_sibling(c);
                }
            }
            Some(NodeKind::Text(t)) => {
                line.push('"');
                push_preview(&mut line, t);
                line.push('"');
            }
            Some(NodeKind::Comment(t)) => {
                line.push_str("<!--");
                push_preview(&mut line, t);
                line.push_str("-->");
            }
            None => continue,
        }
        out.push(line);
    }
    out
}

pub fn render(tree: &Tree, root: NodeId) -> String {
    render_lines(tree, root).join("\n")
}
