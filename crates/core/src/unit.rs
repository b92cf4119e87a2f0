//! Code units: the function, class, and block regions extracted from source

use crate::fingerprint::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder name for unnamed units (lambdas, arrow functions, closures).
pub const ANONYMOUS: &str = "<anonymous>";

/// The kind of region a code unit covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Function,
    Class,
    Block,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Function => write!(f, "function"),
            UnitKind::Class => write!(f, "class"),
            UnitKind::Block => write!(f, "block"),
        }
    }
}

/// A semantic region of source extracted by a language plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub kind: UnitKind,

    /// Unit name; [`ANONYMOUS`] when the grammar provides none. Blocks use
    /// hierarchical names like `load.for_1.if_1`.
    pub name: String,

    pub language_id: String,

    pub file_path: PathBuf,

    /// 1-based, inclusive.
    pub start_line: usize,

    /// 1-based, inclusive.
    pub end_line: usize,

    /// Node count of the unit's structural subgraph.
    pub node_count: usize,

    /// Raw source slice of the region.
    pub source_text: String,

    /// Whitespace-normalized source, used for import-only detection.
    pub extracted_code: String,

    /// Block type tag (`for`, `while`, `if`, ...); present iff `kind` is
    /// [`UnitKind::Block`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,

    /// Enclosing class for methods, enclosing function or block for blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

impl CodeUnit {
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Digest of the unit's raw source bytes. Drives suppression and index
    /// staleness.
    pub fn evidence_digest(&self) -> Digest {
        Digest::of_bytes(self.source_text.as_bytes())
    }

    /// Module-wiring boilerplate surfaced by symbol servers is not an
    /// actionable duplication signal and is dropped at extraction time.
    pub fn is_import_only(&self) -> bool {
        let code = self.extracted_code.trim_start();
        code.starts_with("import ") || code.starts_with("from ")
    }

    /// Dedup key for overlapping ranges produced by grammar oddities.
    pub fn dedup_key(&self) -> (UnitKind, usize, usize, &str) {
        (self.kind, self.start_line, self.end_line, &self.name)
    }

    /// `path:start-end` location string used in reports and findings.
    pub fn location(&self) -> String {
        format!(
            "{}:{}-{}",
            self.file_path.display(),
            self.start_line,
            self.end_line
        )
    }
}

/// Collapse all whitespace runs to single spaces.
pub fn normalize_whitespace(source: &str) -> String {
    source.split_whitespace().collect::<Vec<_>>().join(" ")
}
