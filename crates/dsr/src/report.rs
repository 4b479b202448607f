//! Non-fatal warnings raised while computing ranges.

use crate::options::DsrOptions;
use dom::predicates::uses_url_link_syntax;
use dom::{NodeId, Offset, Tree};
use std::fmt;

pub const NEGATIVE_TARGET: &str = "dsr.negative";
pub const INCONSISTENT_TARGET: &str = "dsr.inconsistent";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DsrWarning {
    /// A computed end offset was below zero and got clamped.
    NegativeRange { node: NodeId, name: String },
    /// A node's computed start disagrees with the start its parent expected.
    RangeInconsistency {
        node: NodeId,
        name: String,
        expected_start: Offset,
        computed_start: Offset,
    },
}

impl fmt::Display for DsrWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DsrWarning::NegativeRange { node, name } => {
                write!(f, "negative DSR for {name} {node}; resetting to zero")
            }
            DsrWarning::RangeInconsistency {
                node,
                name,
                expected_start,
                computed_start,
            } => write!(
                f,
                "cs/s mismatch for {name} {node}: s={expected_start}, cs={computed_start}"
            ),
        }
    }
}

/// Warnings collected over one run, in the order they were raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DsrReport {
    pub warnings: Vec<DsrWarning>,
}

impl DsrReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn negative_ranges(&self) -> impl Iterator<Item = &DsrWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DsrWarning::NegativeRange { .. }))
    }

    pub fn inconsistencies(&self) -> impl Iterator<Item = &DsrWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, DsrWarning::RangeInconsistency { .. }))
    }

    pub(crate) fn push(&mut self, warning: DsrWarning) {
        let target = match warning {
            DsrWarning::NegativeRange { .. } => NEGATIVE_TARGET,
            DsrWarning::RangeInconsistency { .. } => INCONSISTENT_TARGET,
        };
        log::warn!(target: target, "{warning}");
        self.warnings.push(warning);
    }
}

/// Start mismatches that are expected and not worth a warning:
///
/// 1. Bare URL links: the rendered text is the canonicalized/decoded href,
///    whose width need not match the source.
/// 2. `body` during attribute expansion: attribute content carries no
///    source offsets of its own.
pub fn acceptable_inconsistency(tree: &Tree, options: &DsrOptions, node: NodeId) -> bool {
    if tree.is_named(node, "a") {
        return tree
            .data(node)
            .is_some_and(|dp| uses_url_link_syntax(tree, node, dp));
    }
    options.attr_expansion && tree.is_named(node, "body")
}
