use crate::TRACE_TARGET;
use dom::predicates::{comment_source_len, is_tpl_start_marker_meta, text_source_len};
use dom::{DomSourceRange, NodeId, NodeKind, Offset, Tree};

/// Outcome of pushing a resolved end offset into the following siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Propagation {
    /// Stopped at a sibling whose start must not change.
    Stopped,
    /// Walked past the last sibling; the value is the parent's new end.
    RanOff(Option<Offset>),
}

/// Push `end` rightward from `from` into each next sibling's start.
///
/// Stops before template content and at the first element sibling that is
/// fostered, already starts at the propagated offset, or has a TSR-derived
/// start below it. Updated siblings get their end raised to at least their
/// new start, and propagation continues from that end.
pub(crate) fn propagate_right(tree: &mut Tree, from: NodeId, end: Offset) -> Propagation {
    let mut new_ce = Some(end);
    let mut sibling = tree.next_sibling(from);
    while let (Some(ce), Some(sib)) = (new_ce, sibling) {
        if is_tpl_start_marker_meta(tree, sib) {
            break;
        }
        match tree.kind(sib) {
            Some(NodeKind::Text(_)) => new_ce = Some(ce + text_source_len(tree, sib)),
            Some(NodeKind::Comment(_)) => new_ce = Some(ce + comment_source_len(tree, sib)),
            Some(NodeKind::Element(el)) => {
                let name = el.name.clone();
                let Some(dp) = tree.data_mut(sib) else {
                    break;
                };
                let cur = dp.dsr.unwrap_or_default();
                if dp.fostered
                    || cur.start == Some(ce)
                    || (dp.tsr.is_some() && cur.start.is_some_and(|s| s < ce))
                {
                    break;
                }
                log::trace!(
                    target: TRACE_TARGET,
                    "     CHANGING ce.start of {name} from {:?} to {ce}",
                    cur.start
                );
                let end = cur.end.map(|e| e.max(ce));
                dp.dsr = Some(DomSourceRange { start: Some(ce), end, ..cur });
                new_ce = end;
            }
            None => break,
        }
        sibling = tree.next_sibling(sib);
    }
    match sibling {
        Some(_) => Propagation::Stopped,
        None => Propagation::RanOff(new_ce),
    }
}
