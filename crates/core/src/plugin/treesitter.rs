//! Grammar-generic language plugin backed by tree-sitter
//!
//! [`TreeSitterPlugin`] implements the full [`LanguagePlugin`] capability for
//! any tree-sitter grammar; a concrete language supplies a small
//! [`GrammarHooks`] implementation (label rules, unit classification, naming).

use super::{LanguagePlugin, PluginError};
use crate::graph::{GraphNode, LabeledGraph};
use crate::unit::{normalize_whitespace, CodeUnit, UnitKind, ANONYMOUS};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

/// Generic label used for all identifier nodes.
pub const IDENTIFIER_LABEL: &str = "identifier";

/// Generic label used for all literal nodes.
pub const LITERAL_LABEL: &str = "literal";

/// Generic class operators collapse to under pattern normalization.
pub const OPERATOR_LABEL: &str = "op";

/// Single-character tokens that are operators, not punctuation. Everything
/// else of length one is skipped by [`default_should_skip`].
const OPERATOR_CHARS: &str = "+-*/%<>&|^!~@";

/// Hooks a concrete language supplies to the generic plugin
pub trait GrammarHooks: Send + Sync {
    /// Bind the grammar.
    fn grammar(&self) -> Language;

    fn language_id(&self) -> &'static str;

    fn file_extensions(&self) -> &'static [&'static str];

    fn skip_dirs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Structural label for a CST node.
    ///
    /// Labels MUST derive from structure only: identifiers map to a fixed
    /// token, literals map to a fixed token, and operators carry their text
    /// only when `normalize_ops` is false. Most implementations delegate to
    /// [`structural_label`].
    fn node_label(&self, node: &Node, source: &[u8], normalize_ops: bool) -> String;

    fn is_function_node(&self, node: &Node) -> bool;

    fn is_class_node(&self, node: &Node) -> bool;

    /// Declared name of a function or class node, if the grammar exposes one.
    fn node_name(&self, node: &Node, source: &[u8]) -> Option<String>;

    fn is_block_node(&self, _node: &Node) -> bool {
        false
    }

    fn should_skip_node(&self, node: &Node) -> bool {
        default_should_skip(node)
    }

    /// Block type tag for a block node (`for`, `while`, ...).
    fn block_type(&self, node: &Node) -> String {
        node.kind().to_string()
    }
}

/// Default skip rule: drop single-character punctuation tokens, keep
/// everything named and every operator token.
pub fn default_should_skip(node: &Node) -> bool {
    if node.is_named() {
        return false;
    }
    let kind = node.kind();
    let mut chars = kind.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => !OPERATOR_CHARS.contains(c),
        _ => false,
    }
}

/// Shared labeling rule used by the concrete hooks.
///
/// `identifiers` and `literals` are the grammar's node kinds for those
/// classes; `operators` lists the anonymous operator tokens that collapse to
/// [`OPERATOR_LABEL`] under normalization.
pub fn structural_label(
    node: &Node,
    identifiers: &[&str],
    literals: &[&str],
    operators: &[&str],
    normalize_ops: bool,
) -> String {
    let kind = node.kind();
    if identifiers.contains(&kind) {
        return IDENTIFIER_LABEL.to_string();
    }
    if literals.contains(&kind) {
        return LITERAL_LABEL.to_string();
    }
    if !node.is_named() && operators.contains(&kind) {
        return if normalize_ops {
            OPERATOR_LABEL.to_string()
        } else {
            kind.to_string()
        };
    }
    kind.to_string()
}

/// Strip the longest common leading whitespace from every non-blank line.
///
/// Unit source is sliced on line boundaries, so method and block bodies keep
/// their file-level indentation; indentation-sensitive grammars need it gone
/// before a fragment re-parse.
pub fn dedent(source: &str) -> String {
    let indent = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return source.to_string();
    }
    source
        .lines()
        .map(|line| if line.len() >= indent { &line[indent..] } else { line.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tree-sitter-backed implementation of [`LanguagePlugin`]
pub struct TreeSitterPlugin<H: GrammarHooks> {
    hooks: H,
    max_block_depth: usize,
}

impl<H: GrammarHooks> TreeSitterPlugin<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            max_block_depth: 5,
        }
    }

    /// Limit hierarchical block extraction depth.
    pub fn with_max_block_depth(mut self, depth: usize) -> Self {
        self.max_block_depth = depth;
        self
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    fn parse(&self, source: &[u8]) -> Result<Tree, PluginError> {
        std::str::from_utf8(source)?;
        let mut parser = Parser::new();
        parser
            .set_language(&self.hooks.grammar())
            .map_err(|e| PluginError::Grammar(e.to_string()))?;
        parser.parse(source, None).ok_or_else(|| {
            PluginError::ParseFailure(format!(
                "{} grammar produced no tree",
                self.hooks.language_id()
            ))
        })
    }

    /// Parse a whole file; a tree whose root contains errors counts as a
    /// parse failure so broken files are skipped and reported rather than
    /// fingerprinted on recovery guesses.
    fn parse_strict(&self, source: &[u8]) -> Result<Tree, PluginError> {
        let tree = self.parse(source)?;
        if tree.root_node().has_error() {
            return Err(PluginError::ParseFailure(format!(
                "{} source contains syntax errors",
                self.hooks.language_id()
            )));
        }
        Ok(tree)
    }

    fn build_graph(&self, root: Node, source: &[u8]) -> LabeledGraph {
        let mut graph = LabeledGraph::new();
        self.add_subtree(&mut graph, root, source, None);
        graph
    }

    fn add_subtree(
        &self,
        graph: &mut LabeledGraph,
        node: Node,
        source: &[u8],
        parent: Option<crate::graph::NodeId>,
    ) {
        let label = self.hooks.node_label(&node, source, false);
        let pattern = self.hooks.node_label(&node, source, true);
        let is_literal = label == LITERAL_LABEL;
        let id = graph.add_node(GraphNode::with_pattern_label(label, pattern));
        if let Some(parent) = parent {
            graph.add_child(parent, id);
        }
        // Literals are leaves: their internal tokens (quotes, escapes,
        // interpolation delimiters) must not leak value differences into the
        // structure.
        if is_literal {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if self.hooks.should_skip_node(&child) {
                continue;
            }
            self.add_subtree(graph, child, source, Some(id));
        }
    }

    /// Graph for a unit's source fragment. Fragment parses are lenient:
    /// recovery nodes label deterministically, and identical fragments make
    /// identical trees, which is all fingerprinting needs.
    fn fragment_graph(&self, source_text: &str) -> Result<LabeledGraph, PluginError> {
        let dedented = dedent(source_text);
        let tree = self.parse(dedented.as_bytes())?;
        Ok(self.build_graph(tree.root_node(), dedented.as_bytes()))
    }

    fn make_unit(
        &self,
        node: &Node,
        kind: UnitKind,
        name: String,
        block_type: Option<String>,
        parent_name: Option<String>,
        lines: &[&str],
        file_path: &Path,
    ) -> Option<CodeUnit> {
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        if start_line > end_line || end_line > lines.len() {
            return None;
        }
        let source_text = lines[start_line - 1..end_line].join("\n");
        let extracted_code = normalize_whitespace(&source_text);

        let mut unit = CodeUnit {
            kind,
            name,
            language_id: self.hooks.language_id().to_string(),
            file_path: file_path.to_path_buf(),
            start_line,
            end_line,
            node_count: 0,
            source_text,
            extracted_code,
            block_type,
            parent_name,
        };

        if unit.is_import_only() {
            return None;
        }

        match self.fragment_graph(&unit.source_text) {
            Ok(graph) => {
                unit.node_count = graph.node_count();
                Some(unit)
            }
            Err(err) => {
                debug!(
                    unit = %unit.name,
                    file = %file_path.display(),
                    %err,
                    "skipping unit: fragment did not parse"
                );
                None
            }
        }
    }

    fn collect_units(
        &self,
        node: Node,
        source: &[u8],
        lines: &[&str],
        file_path: &Path,
        parent_name: Option<&str>,
        units: &mut Vec<CodeUnit>,
    ) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if self.hooks.is_function_node(&child) {
                let name = self
                    .hooks
                    .node_name(&child, source)
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                if let Some(unit) = self.make_unit(
                    &child,
                    UnitKind::Function,
                    name.clone(),
                    None,
                    parent_name.map(String::from),
                    lines,
                    file_path,
                ) {
                    units.push(unit);
                }
                let mut counters = HashMap::new();
                self.collect_blocks(
                    child,
                    source,
                    lines,
                    file_path,
                    &name,
                    1,
                    &mut counters,
                    units,
                );
                // Nested functions and classes are emitted independently.
                self.collect_units(child, source, lines, file_path, Some(&name), units);
            } else if self.hooks.is_class_node(&child) {
                let name = self
                    .hooks
                    .node_name(&child, source)
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                if let Some(unit) = self.make_unit(
                    &child,
                    UnitKind::Class,
                    name.clone(),
                    None,
                    parent_name.map(String::from),
                    lines,
                    file_path,
                ) {
                    units.push(unit);
                }
                self.collect_units(child, source, lines, file_path, Some(&name), units);
            } else {
                self.collect_units(child, source, lines, file_path, parent_name, units);
            }
        }
    }

    /// Walk a function or block body for control-flow blocks, naming them
    /// hierarchically (`load.for_1`, `load.for_1.if_1`) with per-container
    /// counters. Stops at nested function and class boundaries; those get
    /// their own pass.
    #[allow(clippy::too_many_arguments)]
    fn collect_blocks(
        &self,
        node: Node,
        source: &[u8],
        lines: &[&str],
        file_path: &Path,
        container_name: &str,
        depth: usize,
        counters: &mut HashMap<String, usize>,
        units: &mut Vec<CodeUnit>,
    ) {
        if depth > self.max_block_depth {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if self.hooks.is_function_node(&child) || self.hooks.is_class_node(&child) {
                continue;
            }
            if self.hooks.is_block_node(&child) {
                let block_type = self.hooks.block_type(&child);
                let count = counters.entry(block_type.clone()).or_insert(0);
                *count += 1;
                let name = format!("{}.{}_{}", container_name, block_type, count);
                if let Some(unit) = self.make_unit(
                    &child,
                    UnitKind::Block,
                    name.clone(),
                    Some(block_type),
                    Some(container_name.to_string()),
                    lines,
                    file_path,
                ) {
                    units.push(unit);
                }
                let mut inner_counters = HashMap::new();
                self.collect_blocks(
                    child,
                    source,
                    lines,
                    file_path,
                    &name,
                    depth + 1,
                    &mut inner_counters,
                    units,
                );
            } else {
                self.collect_blocks(
                    child,
                    source,
                    lines,
                    file_path,
                    container_name,
                    depth,
                    counters,
                    units,
                );
            }
        }
    }
}

impl<H: GrammarHooks> LanguagePlugin for TreeSitterPlugin<H> {
    fn language_id(&self) -> &str {
        self.hooks.language_id()
    }

    fn file_extensions(&self) -> &[&str] {
        self.hooks.file_extensions()
    }

    fn skip_dirs(&self) -> &[&str] {
        self.hooks.skip_dirs()
    }

    fn source_to_graph(&self, source: &[u8]) -> Result<LabeledGraph, PluginError> {
        let tree = self.parse_strict(source)?;
        Ok(self.build_graph(tree.root_node(), source))
    }

    fn extract_code_units(
        &self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<Vec<CodeUnit>, PluginError> {
        let text = std::str::from_utf8(source)?;
        let tree = self.parse_strict(source)?;
        let lines: Vec<&str> = text.lines().collect();

        let mut units = Vec::new();
        self.collect_units(tree.root_node(), source, &lines, file_path, None, &mut units);

        // Grammar oddities can yield overlapping ranges; first occurrence wins.
        let mut seen = HashSet::new();
        units.retain(|unit| {
            let (kind, start, end, name) = unit.dedup_key();
            seen.insert((kind, start, end, name.to_string()))
        });

        Ok(units)
    }

    fn code_unit_to_ast_graph(&self, unit: &CodeUnit) -> Result<LabeledGraph, PluginError> {
        self.fragment_graph(&unit.source_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent_common_prefix() {
        let src = "    def m(self):\n        return 1";
        assert_eq!(dedent(src), "def m(self):\n    return 1");
    }

    #[test]
    fn test_dedent_ignores_blank_lines() {
        let src = "    if x:\n\n        pass";
        assert_eq!(dedent(src), "if x:\n\n    pass");
    }

    #[test]
    fn test_dedent_noop_at_margin() {
        let src = "def f():\n    pass";
        assert_eq!(dedent(src), src);
    }
}
