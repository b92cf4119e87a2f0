//! Code units sourced from an external symbol server
//!
//! Language servers already know where functions and classes live; this
//! plugin turns their document symbols into [`CodeUnit`]s without a grammar.
//! Symbol ranges are advisory: the same significance thresholds and the
//! import-only filter apply downstream exactly as for CST-derived units.

use super::{LanguagePlugin, PluginError};
use crate::graph::{GraphNode, LabeledGraph};
use crate::unit::{normalize_whitespace, CodeUnit, UnitKind, ANONYMOUS};
use std::collections::HashSet;
use std::path::Path;

/// One symbol reported by a language server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSpan {
    /// Server-reported kind, lowercase (`"function"`, `"method"`,
    /// `"class"`, `"struct"`, ...).
    pub symbol_kind: String,
    pub name: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
}

/// Contract an external symbol server fulfills.
pub trait SymbolProvider: Send + Sync {
    fn document_symbols(&self, file_path: &Path) -> Result<Vec<SymbolSpan>, PluginError>;
}

/// Plugin that derives units from a [`SymbolProvider`]
pub struct LspPlugin<P: SymbolProvider> {
    provider: P,
    language_id: String,
    extensions: Vec<&'static str>,
}

impl<P: SymbolProvider> LspPlugin<P> {
    pub fn new(
        provider: P,
        language_id: impl Into<String>,
        extensions: Vec<&'static str>,
    ) -> Self {
        Self {
            provider,
            language_id: language_id.into(),
            extensions,
        }
    }
}

fn kind_for_symbol(symbol_kind: &str) -> UnitKind {
    match symbol_kind {
        "class" | "struct" | "interface" | "enum" | "trait" => UnitKind::Class,
        _ => UnitKind::Function,
    }
}

/// Depth-1 graph over a source fragment: root labeled by the unit kind, one
/// child per non-blank line carrying the line's whitespace-normalized text.
fn line_graph(root_label: &str, source_text: &str) -> LabeledGraph {
    let mut graph = LabeledGraph::new();
    let root = graph.add_node(GraphNode::new(root_label));
    for line in source_text.lines() {
        let normalized = normalize_whitespace(line);
        if normalized.is_empty() {
            continue;
        }
        let child = graph.add_node(GraphNode::new(normalized));
        graph.add_child(root, child);
    }
    graph
}

impl<P: SymbolProvider> LanguagePlugin for LspPlugin<P> {
    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn file_extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn source_to_graph(&self, source: &[u8]) -> Result<LabeledGraph, PluginError> {
        let text = std::str::from_utf8(source)?;
        Ok(line_graph("document", text))
    }

    fn extract_code_units(
        &self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<Vec<CodeUnit>, PluginError> {
        let text = std::str::from_utf8(source)?;
        let lines: Vec<&str> = text.lines().collect();
        let symbols = self.provider.document_symbols(file_path)?;

        let mut units = Vec::new();
        for symbol in symbols {
            if symbol.start_line == 0
                || symbol.start_line > symbol.end_line
                || symbol.end_line > lines.len()
            {
                continue;
            }
            let kind = kind_for_symbol(&symbol.symbol_kind);
            let source_text = lines[symbol.start_line - 1..symbol.end_line].join("\n");
            let extracted_code = normalize_whitespace(&source_text);
            let name = if symbol.name.is_empty() {
                ANONYMOUS.to_string()
            } else {
                symbol.name
            };

            let mut unit = CodeUnit {
                kind,
                name,
                language_id: self.language_id.clone(),
                file_path: file_path.to_path_buf(),
                start_line: symbol.start_line,
                end_line: symbol.end_line,
                node_count: 0,
                source_text,
                extracted_code,
                block_type: None,
                parent_name: None,
            };

            if unit.is_import_only() {
                continue;
            }
            unit.node_count = line_graph(&unit.kind.to_string(), &unit.source_text).node_count();
            units.push(unit);
        }

        let mut seen = HashSet::new();
        units.retain(|unit| {
            let (kind, start, end, name) = unit.dedup_key();
            seen.insert((kind, start, end, name.to_string()))
        });

        Ok(units)
    }

    fn code_unit_to_ast_graph(&self, unit: &CodeUnit) -> Result<LabeledGraph, PluginError> {
        Ok(line_graph(&unit.kind.to_string(), &unit.source_text))
    }
}
