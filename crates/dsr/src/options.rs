use crate::tables::TagTables;
use dom::Offset;

/// Options governing one DSR computation.
#[derive(Clone, Copy, Debug)]
pub struct DsrOptions {
    /// `[start, end)` source offsets of the tree's content. Defaults to
    /// `(0, source_len)`.
    pub source_offsets: Option<(Offset, Offset)>,
    /// The tree is the output of an attribute-expansion sub-pipeline.
    /// Attribute content has no source offsets of its own, so a mismatch on
    /// the body boundary is expected.
    pub attr_expansion: bool,
    /// Round-trip test mode: disables the edit-mode corrections for stripped
    /// and auto-inserted quote tags.
    pub rt_test_mode: bool,
    pub tables: &'static TagTables,
}

impl Default for DsrOptions {
    fn default() -> Self {
        Self {
            source_offsets: None,
            attr_expansion: false,
            rt_test_mode: false,
            tables: TagTables::wikitext(),
        }
    }
}

impl DsrOptions {
    pub fn with_source_offsets(mut self, start: Offset, end: Offset) -> Self {
        self.source_offsets = Some((start, end));
        self
    }

    pub fn with_attr_expansion(mut self, attr_expansion: bool) -> Self {
        self.attr_expansion = attr_expansion;
        self
    }

    pub fn with_rt_test_mode(mut self, rt_test_mode: bool) -> Self {
        self.rt_test_mode = rt_test_mode;
        self
    }

    pub(crate) fn resolve_offsets(&self, source_len: Offset) -> (Offset, Offset) {
        self.source_offsets.unwrap_or((0, source_len))
    }
}
