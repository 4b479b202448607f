//! DOM source range (DSR) inference.
//!
//! The tokenizer only records where individual tags sat in the source
//! (their TSR). [`compute_dsr`] walks the built tree right to left and
//! infers, for every element it can, the full source span of its subtree
//! plus the widths of its opening and closing syntax. End-tag and TSR
//! marker metas are consumed along the way and removed from the tree.

pub mod fixup;
pub mod tables;
pub mod widths;

mod compute;
mod error;
mod options;
mod propagate;
mod report;

use crate::compute::NodeRangeComputer;
use dom::{DomSourceRange, NodeId, Offset, Tree};

pub use crate::compute::TraversalState;
pub use crate::error::DsrError;
pub use crate::options::DsrOptions;
pub use crate::report::{
    DsrReport, DsrWarning, INCONSISTENT_TARGET, NEGATIVE_TARGET, acceptable_inconsistency,
};
pub use crate::tables::TagTables;

/// Log target of the per-node trace.
pub const TRACE_TARGET: &str = "dsr.trace";

/// Compute source ranges for every element under `root`.
///
/// `source_len` is the document length in characters; `root` always ends
/// up with `[start, end, 0, 0]` for the configured source offsets.
pub fn compute_dsr(
    tree: &mut Tree,
    root: NodeId,
    source_len: Offset,
    options: &DsrOptions,
) -> Result<DsrReport, DsrError> {
    if !tree.is_element(root) {
        return Err(DsrError::RootNotElement(root));
    }
    let (start, end) = options.resolve_offsets(source_len);
    log::trace!(target: TRACE_TARGET, "------- tracing DSR computation -------");

    let mut computer = NodeRangeComputer::new(tree, options);
    computer.run(root, Some(start), Some(end))?;
    let report = computer.into_report();

    if let Some(dp) = tree.data_mut(root) {
        dp.dsr = Some(DomSourceRange::known(start, end, 0, 0));
    }
    log::trace!(target: TRACE_TARGET, "------- done tracing computation -------");
    Ok(report)
}
