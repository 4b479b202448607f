//! Immutable tag tables shared by every DSR run.

use dom::{Offset, TagWidths};

/// Process-wide constant lookup tables, injected through
/// [`DsrOptions`](crate::DsrOptions).
#[derive(Debug)]
pub struct TagTables {
    /// Default (open, close) syntax widths by tag name.
    pub tag_widths: &'static [(&'static str, TagWidths)],
    /// Tags whose TSR covers only the opening tag.
    pub limited_tsr: &'static [&'static str],
    /// Tags produced by `''`/`'''` quote syntax.
    pub quote_tags: &'static [&'static str],
    pub list_tags: &'static [&'static str],
    /// Items whose opening width is the list nesting depth.
    pub list_item_tags: &'static [&'static str],
    pub formatting_tags: &'static [&'static str],
}

const fn w(open: Option<Offset>, close: Option<Offset>) -> TagWidths {
    TagWidths { open, close }
}

const fn both(open: Offset, close: Offset) -> TagWidths {
    w(Some(open), Some(close))
}

static WIKITEXT: TagTables = TagTables {
    tag_widths: &[
        ("body", both(0, 0)),
        ("html", both(0, 0)),
        ("head", both(0, 0)),
        ("p", both(0, 0)),
        ("meta", both(0, 0)),
        ("tbody", both(0, 0)),
        ("pre", both(1, 0)),
        ("ol", both(0, 0)),
        ("ul", both(0, 0)),
        ("dl", both(0, 0)),
        ("li", both(1, 0)),
        ("dt", both(1, 0)),
        ("dd", both(1, 0)),
        ("h1", both(1, 1)),
        ("h2", both(2, 2)),
        ("h3", both(3, 3)),
        ("h4", both(4, 4)),
        ("h5", both(5, 5)),
        ("h6", both(6, 6)),
        ("hr", both(4, 0)),
        ("table", both(2, 2)),
        ("tr", w(None, Some(0))),
        ("td", w(None, Some(0))),
        ("th", w(None, Some(0))),
        ("b", both(3, 3)),
        ("i", both(2, 2)),
        ("br", both(0, 0)),
        ("figure", both(2, 2)),
    ],
    limited_tsr: &[
        "b", "i", "h1", "h2", "h3", "h4", "h5", "ul", "ol", "dl", "li", "dt", "dd", "table",
        "caption", "tr", "td", "th", "hr", "br", "pre",
    ],
    quote_tags: &["i", "b"],
    list_tags: &["ul", "ol", "dl"],
    list_item_tags: &["li", "dd"],
    formatting_tags: &[
        "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
        "u",
    ],
};

impl TagTables {
    /// Tables for wikitext-sourced trees.
    pub fn wikitext() -> &'static TagTables {
        &WIKITEXT
    }

    pub fn default_widths(&self, name: &str) -> Option<TagWidths> {
        self.tag_widths
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, widths)| widths)
    }

    pub fn has_limited_tsr(&self, name: &str) -> bool {
        self.limited_tsr.iter().any(|n| *n == name)
    }

    pub fn is_quote_tag(&self, name: &str) -> bool {
        self.quote_tags.iter().any(|n| *n == name)
    }

    pub fn is_list(&self, name: &str) -> bool {
        self.list_tags.iter().any(|n| *n == name)
    }

    pub fn is_list_item(&self, name: &str) -> bool {
        self.list_item_tags.iter().any(|n| *n == name)
    }

    pub fn is_formatting(&self, name: &str) -> bool {
        self.formatting_tags.iter().any(|n| *n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_widths_match_level() {
        let t = TagTables::wikitext();
        for level in 1..=6 {
            let name = format!("h{level}");
            assert_eq!(t.default_widths(&name), Some(both(level, level)));
        }
    }

    #[test]
    fn table_cells_have_unknown_open_width() {
        let t = TagTables::wikitext();
        assert_eq!(t.default_widths("td"), Some(w(None, Some(0))));
        assert_eq!(t.default_widths("span"), None);
    }

    #[test]
    fn membership_tables() {
        let t = TagTables::wikitext();
        assert!(t.is_quote_tag("b") && t.is_quote_tag("i"));
        assert!(!t.is_quote_tag("u"));
        assert!(t.is_list("dl") && !t.is_list("li"));
        assert!(t.has_limited_tsr("pre") && !t.has_limited_tsr("a"));
        assert!(t.is_formatting("a") && !t.is_formatting("div"));
    }
}
