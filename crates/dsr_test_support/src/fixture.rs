//! Annotated-tree fixtures with expected range snapshots.
//!
//! A fixture describes the children of a `body` root, the source they came
//! from, and the snapshot lines `dom::snapshot::render_lines` should produce
//! once ranges are computed. Fixtures are TOML or JSON, picked by extension.

use dom::{NodeData, NodeId, Offset, SourceRange, Syntax, TagWidths, Tree, char_len};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const FIXTURE_FORMAT_V1: &str = "dsr-fixture-v1";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureOptions {
    pub source_offsets: Option<[Offset; 2]>,
    #[serde(default)]
    pub attr_expansion: bool,
    #[serde(default)]
    pub rt_test_mode: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub format: String,
    pub name: String,
    /// Source text; its character count is the document length unless
    /// `source_len` overrides it.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_len: Option<Offset>,
    #[serde(default)]
    pub options: FixtureOptions,
    #[serde(default)]
    pub nodes: Vec<FixtureNode>,
    pub expected: String,
    /// Number of warnings the run must report.
    #[serde(default)]
    pub warnings: usize,
}

/// One node: exactly one of `name`, `text` or `comment` is set.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureNode {
    pub name: Option<String>,
    pub text: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    pub tsr: Option<[Offset; 2]>,
    pub stx: Option<String>,
    #[serde(default)]
    pub auto_inserted_start: bool,
    #[serde(default)]
    pub auto_inserted_end: bool,
    #[serde(default)]
    pub fostered: bool,
    #[serde(default)]
    pub self_close: bool,
    #[serde(default)]
    pub native_ext: bool,
    pub tag_widths: Option<[Offset; 2]>,
    pub start_tag_src: Option<String>,
    pub end_tag_src: Option<String>,
    pub src: Option<String>,
    /// Stored pre-expansion attributes (`href` for wikilinks).
    #[serde(default)]
    pub sa: BTreeMap<String, String>,
    pub target_offset: Option<Offset>,
    /// Tag name recorded on stripped-tag placeholders.
    pub stripped_name: Option<String>,
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

impl FixtureNode {
    fn data(&self) -> NodeData {
        NodeData {
            tsr: self.tsr.map(|[s, e]| SourceRange::new(s, e)),
            stx: self.stx.as_deref().map(Syntax::parse),
            auto_inserted_start: self.auto_inserted_start,
            auto_inserted_end: self.auto_inserted_end,
            fostered: self.fostered,
            self_close: self.self_close,
            tag_widths: self.tag_widths.map(|[o, c]| TagWidths::new(Some(o), Some(c))),
            start_tag_src: self.start_tag_src.clone(),
            end_tag_src: self.end_tag_src.clone(),
            src: self.src.clone(),
            stored_attrs: self.sa.clone(),
            target_offset: self.target_offset,
            name: self.stripped_name.clone(),
            tmp: dom::TmpData {
                native_ext: self.native_ext,
                ..dom::TmpData::default()
            },
            ..NodeData::default()
        }
    }

    fn create(&self, tree: &mut Tree) -> Result<NodeId, String> {
        let id = match (&self.name, &self.text, &self.comment) {
            (Some(name), None, None) => {
                let id = tree.create_element_with(name, self.data());
                for (k, v) in &self.attrs {
                    tree.set_attr(id, k, v).map_err(|err| err.to_string())?;
                }
                id
            }
            (None, Some(text), None) => tree.create_text(text.as_str()),
            (None, None, Some(comment)) => tree.create_comment(comment.as_str()),
            _ => return Err(format!("node must set exactly one of name/text/comment: {self:?}")),
        };
        for child in &self.children {
            let c = child.create(tree)?;
            tree.append_child(id, c).map_err(|err| err.to_string())?;
        }
        Ok(id)
    }
}

impl Fixture {
    pub fn build_tree(&self) -> Result<Tree, String> {
        let mut tree = Tree::new("body");
        let root = tree.root();
        for node in &self.nodes {
            let id = node.create(&mut tree)?;
            tree.append_child(root, id).map_err(|err| err.to_string())?;
        }
        Ok(tree)
    }

    pub fn source_len(&self) -> Offset {
        self.source_len
            .or_else(|| self.source.as_deref().map(char_len))
            .unwrap_or(0)
    }

    pub fn expected_lines(&self) -> Vec<String> {
        self.expected
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn load_fixture(path: &Path) -> Fixture {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
    let fixture: Fixture = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixture TOML {path:?}: {err}")),
        Some("json") => serde_json::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixture JSON {path:?}: {err}")),
        _ => panic!("unsupported fixture extension: {path:?}"),
    };
    assert_eq!(
        fixture.format, FIXTURE_FORMAT_V1,
        "unsupported fixture format in {path:?}"
    );
    assert!(
        !fixture.expected_lines().is_empty(),
        "fixture {path:?} has no expected lines"
    );
    fixture
}

/// Every `.toml`/`.json` fixture in `dir`, sorted by path.
pub fn load_fixtures(dir: &Path) -> Vec<(PathBuf, Fixture)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read fixture dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("toml" | "json")))
        .collect();
    paths.sort();
    paths
        .into_iter()
        .map(|p| {
            let f = load_fixture(&p);
            (p, f)
        })
        .collect()
}
