//! Per-element side-table metadata.
//!
//! Every element in a [`Tree`](crate::Tree) owns one [`NodeData`] record. The
//! tokenizer/tree-builder fills in the source hints (`tsr`, `stx`, the
//! auto-insertion flags, stored source text, ...); the DSR pass writes `dsr`
//! and consumes `tag_widths`.

use std::collections::BTreeMap;

/// Source offset in character units (not bytes) of the original document.
///
/// Signed because intermediate right-to-left arithmetic can step below zero
/// on inconsistent input; negative ends are clamped before being stored.
pub type Offset = i64;

/// Tag source range assigned by the tokenizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRange {
    pub start: Offset,
    pub end: Offset,
}

impl SourceRange {
    pub fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    pub fn width(self) -> Offset {
        self.end - self.start
    }
}

/// DOM source range: subtree span plus opening/closing syntax widths.
///
/// Any component may be unknown. When both endpoints are known,
/// `start <= end` holds for every range written by the DSR pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DomSourceRange {
    pub start: Option<Offset>,
    pub end: Option<Offset>,
    pub open_width: Option<Offset>,
    pub close_width: Option<Offset>,
}

impl DomSourceRange {
    pub fn new(
        start: Option<Offset>,
        end: Option<Offset>,
        open_width: Option<Offset>,
        close_width: Option<Offset>,
    ) -> Self {
        Self {
            start,
            end,
            open_width,
            close_width,
        }
    }

    /// Fully known range with explicit widths.
    pub fn known(start: Offset, end: Offset, open_width: Offset, close_width: Offset) -> Self {
        Self::new(Some(start), Some(end), Some(open_width), Some(close_width))
    }

    /// Zero-width range at `at` with unknown widths.
    pub fn point(at: Option<Offset>) -> Self {
        Self::new(at, at, None, None)
    }

    /// Both endpoints known and non-negative.
    pub fn is_valid(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s >= 0 && e >= 0)
    }

    /// Span only, widths dropped.
    pub fn span_only(&self) -> Self {
        Self::new(self.start, self.end, None, None)
    }
}

/// Surface syntax that produced an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// Literal HTML tag in the source.
    Html,
    /// `[[target|text]]`
    Piped,
    /// `[[target]]`
    Simple,
    /// Bare URL autolink.
    Url,
    /// RFC/PMID/ISBN style magic link.
    MagicLink,
    /// Any other recorded syntax name.
    Other,
}

impl Syntax {
    pub fn parse(s: &str) -> Self {
        match s {
            "html" => Syntax::Html,
            "piped" => Syntax::Piped,
            "simple" => Syntax::Simple,
            "url" => Syntax::Url,
            "magiclink" => Syntax::MagicLink,
            _ => Syntax::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Html => "html",
            Syntax::Piped => "piped",
            Syntax::Simple => "simple",
            Syntax::Url => "url",
            Syntax::MagicLink => "magiclink",
            Syntax::Other => "other",
        }
    }

    pub fn is_url_like(self) -> bool {
        matches!(self, Syntax::Url | Syntax::MagicLink)
    }
}

/// Precomputed opening/closing tag widths, consumed once by the DSR pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagWidths {
    pub open: Option<Offset>,
    pub close: Option<Offset>,
}

impl TagWidths {
    pub fn new(open: Option<Offset>, close: Option<Offset>) -> Self {
        Self { open, close }
    }
}

/// Transient cross-call state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TmpData {
    /// Range held before an endpoint correction collapsed it.
    pub orig_dsr: Option<DomSourceRange>,
    /// Foreign/native extension content: its children are not descended into.
    pub native_ext: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeData {
    pub tsr: Option<SourceRange>,
    pub dsr: Option<DomSourceRange>,
    pub stx: Option<Syntax>,
    pub auto_inserted_start: bool,
    pub auto_inserted_end: bool,
    pub fostered: bool,
    pub self_close: bool,
    pub tag_widths: Option<TagWidths>,
    pub start_tag_src: Option<String>,
    pub end_tag_src: Option<String>,
    /// Literal source text (entities, placeholders, stripped tags).
    pub src: Option<String>,
    /// Attributes as they were before expansion (`href` for wikilinks).
    pub stored_attrs: BTreeMap<String, String>,
    /// Offset where an external link's target ends and its text begins.
    pub target_offset: Option<Offset>,
    /// Tag name recorded by stripped-tag placeholders.
    pub name: Option<String>,
    pub tmp: TmpData,
}

impl NodeData {
    pub fn with_tsr(start: Offset, end: Offset) -> Self {
        Self {
            tsr: Some(SourceRange::new(start, end)),
            ..Self::default()
        }
    }

    pub fn has_literal_html_marker(&self) -> bool {
        self.stx == Some(Syntax::Html)
    }

    pub fn stored_href(&self) -> Option<&str> {
        self.stored_attrs.get("href").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsr_validity_requires_known_non_negative_endpoints() {
        assert!(DomSourceRange::known(0, 7, 2, 2).is_valid());
        assert!(!DomSourceRange::new(Some(0), None, None, None).is_valid());
        assert!(!DomSourceRange::new(Some(-1), Some(3), None, None).is_valid());
        assert!(DomSourceRange::point(Some(4)).is_valid());
    }

    #[test]
    fn syntax_names_round_trip() {
        for name in ["html", "piped", "simple", "url", "magiclink"] {
            assert_eq!(Syntax::parse(name).as_str(), name);
        }
        assert_eq!(Syntax::parse("row"), Syntax::Other);
        assert!(Syntax::MagicLink.is_url_like());
        assert!(!Syntax::Piped.is_url_like());
    }
}
