//! Right-to-left range inference over one subtree.
//!
//! Each element being processed owns a [`Frame`]: the bounds its parent
//! handed down, its [`TraversalState`], and the child it will look at next.
//! Descending into an element pushes a frame and parks the parent's
//! half-processed child in `pending`; popping a frame resumes it with the
//! subtree's resolved `(start, end)`.

use crate::error::DsrError;
use crate::options::DsrOptions;
use crate::propagate::{Propagation, propagate_right};
use crate::report::{DsrReport, DsrWarning, acceptable_inconsistency};
use crate::widths::tag_widths;
use crate::TRACE_TARGET;
use dom::predicates::{
    TYPEOF, comment_source_len, has_object_attr_property, is_dom_fragment_wrapper,
    is_end_tag_marker, is_literal_html_node, is_nowiki_span, is_placeholder_type,
    is_stripped_tag_placeholder, is_tpl_meta_type, is_tpl_start_marker_meta, is_tsr_marker,
    text_source_len, uses_wiki_link_syntax,
};
use dom::{
    DomSourceRange, NodeId, NodeKind, Offset, SourceRange, Syntax, TagWidths, Tree, TreeError,
    char_len,
};

/// Accumulators carried across one node's right-to-left child walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraversalState {
    /// Start of the child most recently processed.
    pub cs: Option<Offset>,
    /// Running end cursor: the presumed end of the next child to the left.
    pub ce: Option<Offset>,
    /// Source width absorbed from a stripped quote tag, undone at most once.
    pub correction: Offset,
    /// Close width for the next child, recovered from an end-tag marker.
    pub saved_end_tag_width: Option<Offset>,
}

/// Close width and tag name recorded by an end-tag marker.
#[derive(Debug)]
struct EndTagInfo {
    width: Offset,
    name: Option<String>,
}

/// Per-child locals that must survive a descent into the child's subtree.
#[derive(Debug)]
struct ChildStep {
    child: NodeId,
    /// Captured before any edit to the sibling chain.
    prev_child: Option<NodeId>,
    orig_ce: Option<Offset>,
    fostered: bool,
    is_marker: bool,
    end_tag: Option<EndTagInfo>,
    tsr: Option<SourceRange>,
    propagate: bool,
    widths: TagWidths,
}

impl ChildStep {
    fn new(child: NodeId, prev_child: Option<NodeId>, orig_ce: Option<Offset>) -> Self {
        Self {
            child,
            prev_child,
            orig_ce,
            fostered: false,
            is_marker: false,
            end_tag: None,
            tsr: None,
            propagate: false,
            widths: TagWidths::default(),
        }
    }
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    s: Option<Offset>,
    e: Option<Offset>,
    state: TraversalState,
    next_child: Option<NodeId>,
    pending: Option<ChildStep>,
}

impl Frame {
    fn new(tree: &Tree, node: NodeId, s: Option<Offset>, e: Option<Offset>, correction: Offset) -> Self {
        // A childless node with no known end is empty.
        let e = if e.is_none() && !tree.has_children(node) { s } else { e };
        Self {
            node,
            s,
            e,
            state: TraversalState {
                cs: e,
                ce: e,
                correction,
                saved_end_tag_width: None,
            },
            next_child: tree.last_child(node),
            pending: None,
        }
    }
}

/// What an element child needs after its own offsets are settled.
enum Subtree {
    /// Nothing: metas, entities.
    Skip,
    /// Bounds used as the subtree's resolved range without descending.
    Bounds(Option<Offset>, Option<Offset>),
    Descend(Option<Offset>, Option<Offset>),
}

pub(crate) struct NodeRangeComputer<'a> {
    tree: &'a mut Tree,
    options: &'a DsrOptions,
    report: DsrReport,
}

impl<'a> NodeRangeComputer<'a> {
    pub(crate) fn new(tree: &'a mut Tree, options: &'a DsrOptions) -> Self {
        Self {
            tree,
            options,
            report: DsrReport::default(),
        }
    }

    pub(crate) fn into_report(self) -> DsrReport {
        self.report
    }

    /// Resolve `node`'s subtree within `[s, e)`, returning the node's own
    /// `(start, end)`.
    pub(crate) fn run(
        &mut self,
        node: NodeId,
        s: Option<Offset>,
        e: Option<Offset>,
    ) -> Result<(Option<Offset>, Option<Offset>), DsrError> {
        let mut stack = vec![Frame::new(self.tree, node, s, e, 0)];
        let mut resumed = None;
        while let Some(frame) = stack.last_mut() {
            if let Some(range) = resumed.take() {
                if let Some(step) = frame.pending.take() {
                    log::trace!(target: TRACE_TARGET, "</recursion>");
                    widen(&mut frame.state, &step, range);
                    self.settle_element(frame, &step);
                    self.finish_child(frame, step)?;
                }
            }
            match self.advance(frame)? {
                Some(inner) => {
                    log::trace!(target: TRACE_TARGET, "<recursion>");
                    stack.push(inner);
                }
                None => {
                    let range = self.end_frame(frame);
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(range);
                    }
                    resumed = Some(range);
                }
            }
        }
        Ok((s, e))
    }

    /// Process children right to left until one needs its own frame.
    fn advance(&mut self, frame: &mut Frame) -> Result<Option<Frame>, DsrError> {
        while let Some(child) = frame.next_child {
            let mut step = self.begin_child(frame, child);
            if self.tree.is_text(child) {
                if let Some(ce) = frame.state.ce {
                    frame.state.cs = Some(ce - text_source_len(self.tree, child));
                }
            } else if self.tree.is_comment(child) {
                if let Some(ce) = frame.state.ce {
                    frame.state.cs = Some(ce - comment_source_len(self.tree, child));
                }
            } else if self.tree.is_element(child) {
                match self.enter_element(frame, &mut step) {
                    Subtree::Skip => {}
                    Subtree::Bounds(ccs, cce) => widen(&mut frame.state, &step, (ccs, cce)),
                    Subtree::Descend(ccs, cce) => {
                        log::trace!(
                            target: TRACE_TARGET,
                            "     before-recursing:[cs,ce]={:?}; [sw,ew]={:?}; subtree-[cs,ce]={:?}",
                            (frame.state.cs, frame.state.ce),
                            (step.widths.open, step.widths.close),
                            (ccs, cce)
                        );
                        let inner = Frame::new(self.tree, child, ccs, cce, frame.state.correction);
                        frame.pending = Some(step);
                        return Ok(Some(inner));
                    }
                }
                self.settle_element(frame, &step);
            }
            self.finish_child(frame, step)?;
        }
        Ok(None)
    }

    fn begin_child(&mut self, frame: &mut Frame, child: NodeId) -> ChildStep {
        let step = ChildStep::new(child, self.tree.prev_sibling(child), frame.state.ce);
        frame.state.cs = None;
        if !self.options.rt_test_mode {
            self.absorb_stripped_tag(&mut frame.state, child);
        }
        if log::log_enabled!(target: TRACE_TARGET, log::Level::Trace) {
            self.trace_child(frame.node, child, &frame.state);
        }
        step
    }

    /// A stripped quote tag right after a quote element disappears in edit
    /// mode; fold its width into the element so no gap is left behind.
    fn absorb_stripped_tag(&mut self, state: &mut TraversalState, child: NodeId) {
        let tables = self.options.tables;
        let Some(next) = self.tree.next_sibling(child) else {
            return;
        };
        if !self.tree.is_element(next) || !is_stripped_tag_placeholder(self.tree, next) {
            return;
        }
        let Some(dp) = self.tree.data(next) else {
            return;
        };
        let Some(src) = dp.src.as_deref() else {
            return;
        };
        let quote_pair = dp.name.as_deref().is_some_and(|n| tables.is_quote_tag(n))
            && tables.is_quote_tag(self.tree.node_name(child));
        if !quote_pair {
            return;
        }
        let correction = char_len(src);
        let orig = dp.dsr.filter(DomSourceRange::is_valid).map(|d| d.span_only());
        state.ce = state.ce.map(|ce| ce + correction);
        state.correction = correction;
        if let (Some(orig), Some(dp)) = (orig, self.tree.data_mut(next)) {
            dp.tmp.orig_dsr = Some(orig);
        }
    }

    fn enter_element(&mut self, frame: &mut Frame, step: &mut ChildStep) -> Subtree {
        let child = step.child;
        let tables = self.options.tables;
        let Some(dp) = self.tree.data(child) else {
            return Subtree::Skip;
        };
        step.tsr = dp.tsr;
        step.fostered = dp.fostered;
        let auto_start = dp.auto_inserted_start;
        let auto_end = dp.auto_inserted_end;
        let src_len = dp.src.as_deref().filter(|s| !s.is_empty()).map(char_len);
        let name = self.tree.node_name(child);
        let is_meta = name == "meta";
        let state = &mut frame.state;

        // Undo a stripped-tag absorption once the matching auto-closed
        // quote element shows up.
        if !self.options.rt_test_mode
            && state.ce.is_some()
            && auto_end
            && tables.is_quote_tag(name)
        {
            let correction = 3 + char_len(name);
            if correction == state.correction {
                state.ce = state.ce.map(|ce| ce - correction);
                state.correction = 0;
            }
        }

        if is_meta {
            self.enter_meta(state, step, src_len);
            return Subtree::Skip;
        }

        let ty = self.tree.attr(child, TYPEOF);
        if ty == Some("mw:Entity") {
            if let Some((ce, len)) = state.ce.zip(src_len) {
                state.cs = Some(ce - len);
                return Subtree::Skip;
            }
        }

        let mut open = None;
        let placeholder = if is_placeholder_type(ty) {
            state.ce.zip(src_len)
        } else {
            None
        };
        if let Some((ce, len)) = placeholder {
            state.cs = Some(ce - len);
        } else if let Some(tsr) = step.tsr.filter(|_| !auto_start) {
            state.cs = Some(tsr.start);
            if self.tsr_spans_subtree(child) {
                if state.ce.is_none_or(|ce| tsr.end > ce) {
                    state.ce = Some(tsr.end);
                    step.propagate = true;
                }
            } else {
                open = Some(tsr.width());
            }
            log::trace!(
                target: TRACE_TARGET,
                "     TSR: {tsr:?}; cs: {:?}; ce: {:?}",
                state.cs,
                state.ce
            );
        } else if frame.s.is_some() && self.tree.prev_sibling(child).is_none() {
            state.cs = frame.s;
        }

        let prior = TagWidths::new(open, state.saved_end_tag_width);
        let mut widths = tag_widths(self.tree, tables, prior, child);
        if auto_start {
            widths.open = Some(0);
        }
        if auto_end {
            widths.close = Some(0);
        }
        step.widths = widths;

        let ccs = state.cs.zip(widths.open).map(|(cs, w)| cs + w);
        let cce = state.ce.zip(widths.close).map(|(ce, w)| ce - w);
        if self.skips_subtree(child) {
            Subtree::Bounds(ccs, cce)
        } else {
            Subtree::Descend(ccs, cce)
        }
    }

    fn enter_meta(&mut self, state: &mut TraversalState, step: &mut ChildStep, src_len: Option<Offset>) {
        let child = step.child;
        let end_tag = is_end_tag_marker(self.tree, child);
        if end_tag || is_tsr_marker(self.tree, child) {
            if end_tag {
                self.copy_table_end_tag_src(child);
            }
            step.is_marker = true;
            // Markers coming from templates have had their TSR stripped.
            if let Some(tsr) = step.tsr {
                step.end_tag = Some(EndTagInfo {
                    width: tsr.width(),
                    name: self.tree.attr(child, "data-etag").map(str::to_owned),
                });
                state.cs = Some(tsr.end);
                state.ce = Some(tsr.end);
                step.propagate = true;
            }
        } else if let Some(tsr) = step.tsr {
            state.cs = Some(tsr.start);
            state.ce = Some(tsr.end);
            // Template and extension boundaries reset to top-level offsets.
            step.propagate = is_tpl_meta_type(self.tree.attr(child, TYPEOF));
        } else if let Some((ce, len)) = self.meta_placeholder_width(child, state.ce, src_len) {
            state.cs = Some(ce - len);
        } else if has_object_attr_property(self.tree, child) {
            state.cs = state.ce;
        }
        if let Some(widths) = self.tree.data_mut(child).and_then(|dp| dp.tag_widths.take()) {
            step.widths = widths;
        }
    }

    fn meta_placeholder_width(
        &self,
        meta: NodeId,
        ce: Option<Offset>,
        src_len: Option<Offset>,
    ) -> Option<(Offset, Offset)> {
        if is_placeholder_type(self.tree.attr(meta, TYPEOF)) {
            ce.zip(src_len)
        } else {
            None
        }
    }

    /// Wikitext tables learn their closing syntax from the end-tag marker.
    fn copy_table_end_tag_src(&mut self, marker: NodeId) {
        let Some(prev) = self.tree.prev_sibling(marker) else {
            return;
        };
        if !self.tree.is_named(prev, "table") || is_literal_html_node(self.tree, prev) {
            return;
        }
        let Some(src) = self.tree.data(marker).and_then(|dp| dp.end_tag_src.clone()) else {
            return;
        };
        if let Some(dp) = self.tree.data_mut(prev) {
            dp.end_tag_src = Some(src);
        }
    }

    /// The tag's TSR covers its whole subtree, not just the opening tag.
    fn tsr_spans_subtree(&self, id: NodeId) -> bool {
        !(self.options.tables.has_limited_tsr(self.tree.node_name(id))
            || is_literal_html_node(self.tree, id)
            || is_nowiki_span(self.tree, id))
    }

    /// Subtrees whose content cannot account for the element's span:
    /// native extension output, fragment wrappers, and non-piped wikilinks
    /// (their text is the decoded target).
    fn skips_subtree(&self, id: NodeId) -> bool {
        let Some(dp) = self.tree.data(id) else {
            return false;
        };
        dp.tmp.native_ext
            || is_dom_fragment_wrapper(self.tree, id)
            || (self.tree.is_named(id, "a")
                && uses_wiki_link_syntax(self.tree, id, dp)
                && dp.stx != Some(Syntax::Piped))
    }

    /// Stamp the child's range, then push its end into later siblings.
    fn settle_element(&mut self, frame: &mut Frame, step: &ChildStep) {
        let child = step.child;
        let state = &mut frame.state;
        if state.cs.is_some() || state.ce.is_some() {
            if state.ce.is_some_and(|ce| ce < 0) {
                if !step.fostered {
                    self.report.push(DsrWarning::NegativeRange {
                        node: child,
                        name: self.tree.node_name(child).to_owned(),
                    });
                }
                state.ce = Some(0);
            }
            let dsr = if step.fostered {
                DomSourceRange::point(step.orig_ce.map(|ce| ce.max(0)))
            } else {
                // A TSR-pinned start can sit past a clamped cursor.
                let end = match (state.cs, state.ce) {
                    (Some(cs), Some(ce)) => Some(ce.max(cs)),
                    (_, ce) => ce,
                };
                DomSourceRange::new(state.cs, end, step.widths.open, step.widths.close)
            };
            if let Some(dp) = self.tree.data_mut(child) {
                dp.dsr = Some(dsr);
            }
            log::trace!(
                target: TRACE_TARGET,
                "     UPDATING {} with {:?}; typeof: {}",
                self.tree.node_name(child),
                (state.cs, state.ce),
                self.tree.attr(child, TYPEOF).unwrap_or("null")
            );
        }

        let Some(ce) = state.ce else {
            return;
        };
        let moved = step.tsr.map(|t| t.end) != Some(ce);
        if (step.propagate || moved || frame.e.is_none())
            && !is_tpl_start_marker_meta(self.tree, child)
        {
            if let Propagation::RanOff(end) = propagate_right(self.tree, child, ce) {
                frame.e = end;
            }
        }
    }

    fn finish_child(&mut self, frame: &mut Frame, step: ChildStep) -> Result<(), TreeError> {
        let state = &mut frame.state;
        if step.fostered {
            // Fostered content consumes no source at its new position.
            state.ce = step.orig_ce.map(|ce| ce.max(0));
        } else {
            state.ce = state.cs;
            state.saved_end_tag_width = step.end_tag.as_ref().and_then(|info| {
                let prev = self.tree.prev_sibling(step.child)?;
                (info.name.as_deref() == Some(self.tree.node_name(prev))).then_some(info.width)
            });
        }
        frame.next_child = if step.is_marker {
            self.remove_marker(state, step.child, step.prev_child)?
        } else {
            step.prev_child
        };
        Ok(())
    }

    /// Drop a consumed marker. Text on both sides is merged so later
    /// propagation walks one node instead of many.
    fn remove_marker(
        &mut self,
        state: &mut TraversalState,
        marker: NodeId,
        prev_child: Option<NodeId>,
    ) -> Result<Option<NodeId>, TreeError> {
        let mut next_child = prev_child;
        if let (Some(prev), Some(next)) = (prev_child, self.tree.next_sibling(marker)) {
            if self.tree.is_text(prev) && self.tree.is_text(next) {
                if let Some(ce) = state.ce {
                    let cs = ce - text_source_len(self.tree, prev);
                    state.cs = Some(cs);
                    state.ce = Some(cs);
                }
                let mut merged = self.tree.text(prev).unwrap_or_default().to_owned();
                merged.push_str(self.tree.text(next).unwrap_or_default());
                let merged = self.tree.create_text(merged);
                self.tree.replace_child(merged, prev)?;
                self.tree.detach(next)?;
                next_child = self.tree.prev_sibling(merged);
            }
        }
        self.tree.detach(marker)?;
        Ok(next_child)
    }

    fn end_frame(&mut self, frame: &Frame) -> (Option<Offset>, Option<Offset>) {
        let cs = frame.state.cs.or(frame.s);
        if let (Some(s), Some(cs)) = (frame.s, cs) {
            if cs != s && !acceptable_inconsistency(self.tree, self.options, frame.node) {
                self.report.push(DsrWarning::RangeInconsistency {
                    node: frame.node,
                    name: self.tree.node_name(frame.node).to_owned(),
                    expected_start: s,
                    computed_start: cs,
                });
            }
        }
        log::trace!(
            target: TRACE_TARGET,
            "END: {}, returning: {cs:?}, {:?}",
            self.tree.node_name(frame.node),
            frame.e
        );
        (cs, frame.e)
    }

    fn trace_child(&self, parent: NodeId, child: NodeId, state: &TraversalState) {
        let index = self.tree.children(parent).position(|c| c == child).unwrap_or(0);
        let desc = match self.tree.kind(child) {
            Some(NodeKind::Element(el)) => match self.tree.attr(child, TYPEOF) {
                Some(ty) if el.name == "meta" => format!("meta[{ty}]"),
                _ => el.name.clone(),
            },
            Some(NodeKind::Text(t)) => format!("#{t:?}"),
            Some(NodeKind::Comment(t)) => format!("!{t:?}"),
            None => String::new(),
        };
        log::trace!(
            target: TRACE_TARGET,
            "     CHILD: <{}:{index}>={desc} with {:?}",
            self.tree.node_name(parent),
            (state.cs, state.ce)
        );
    }
}

/// Fold a resolved subtree range back into the child's own bounds.
fn widen(
    state: &mut TraversalState,
    step: &ChildStep,
    (sub_start, sub_end): (Option<Offset>, Option<Offset>),
) {
    if let Some((st, start)) = step.widths.open.zip(sub_start) {
        let new_cs = start - st;
        if state.cs.is_none_or(|cs| step.tsr.is_none() && new_cs < cs) {
            state.cs = Some(new_cs);
        }
    }
    if let Some((et, end)) = step.widths.close.zip(sub_end) {
        let new_ce = end + et;
        if state.ce.is_none_or(|ce| new_ce > ce) {
            state.ce = Some(new_ce);
        }
    }
}
