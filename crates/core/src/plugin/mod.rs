//! Language plugins: source bytes in, labeled graphs and code units out

pub mod go;
pub mod lsp;
pub mod python;
pub mod rust;
pub mod treesitter;
pub mod typescript;

use crate::graph::LabeledGraph;
use crate::unit::CodeUnit;
use std::path::Path;
use thiserror::Error;

/// Error types for plugin operations
#[derive(Error, Debug)]
pub enum PluginError {
    /// The grammar could not produce a usable tree for these bytes.
    #[error("failed to parse source: {0}")]
    ParseFailure(String),

    /// The grammar requires UTF-8 and the bytes are not valid UTF-8.
    #[error("source is not valid UTF-8: {0}")]
    UnsupportedEncoding(#[from] std::str::Utf8Error),

    /// No registered plugin claims this file.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar handle could not be bound.
    #[error("grammar error: {0}")]
    Grammar(String),

    /// A symbol provider backing an LSP plugin failed.
    #[error("symbol provider error: {0}")]
    SymbolProvider(String),

    #[error("failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
}

/// Capability set every language plugin provides
///
/// Plugins convert source bytes into [`LabeledGraph`]s and enumerate the
/// [`CodeUnit`]s (functions, classes, optional blocks) those bytes contain.
pub trait LanguagePlugin: Send + Sync {
    /// Unique, stable language identifier (e.g. `"python"`).
    fn language_id(&self) -> &str;

    /// Extensions this plugin claims, dot-prefixed and lowercase.
    fn file_extensions(&self) -> &[&str];

    /// Directory names to prune during tree walks (ecosystem build output).
    fn skip_dirs(&self) -> &[&str] {
        &[]
    }

    /// Parse bytes into the full CST-derived labeled graph.
    fn source_to_graph(&self, source: &[u8]) -> Result<LabeledGraph, PluginError>;

    /// Enumerate functions, classes, and (optionally) blocks.
    fn extract_code_units(
        &self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<Vec<CodeUnit>, PluginError>;

    /// Produce the unit's subgraph.
    fn code_unit_to_ast_graph(&self, unit: &CodeUnit) -> Result<LabeledGraph, PluginError>;
}

/// Resolves plugins by file extension or explicit language id
///
/// Owned by the engine for its lifetime; plugins are owned by the registry.
/// Read-mostly and safe for concurrent readers.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn LanguagePlugin>>,
}

impl PluginRegistry {
    /// Registry with the default plugin set.
    pub fn new() -> Self {
        Self {
            plugins: vec![
                Box::new(python::python_plugin()),
                Box::new(typescript::typescript_plugin()),
                Box::new(typescript::tsx_plugin()),
                Box::new(rust::rust_plugin()),
                Box::new(go::go_plugin()),
            ],
        }
    }

    /// Registry with a custom plugin set; used by tests to build isolated
    /// engine instances.
    pub fn with_plugins(plugins: Vec<Box<dyn LanguagePlugin>>) -> Self {
        Self { plugins }
    }

    /// Default plugin set with a non-default block extraction depth.
    pub fn with_max_block_depth(depth: usize) -> Self {
        Self {
            plugins: vec![
                Box::new(python::python_plugin().with_max_block_depth(depth)),
                Box::new(typescript::typescript_plugin().with_max_block_depth(depth)),
                Box::new(typescript::tsx_plugin().with_max_block_depth(depth)),
                Box::new(rust::rust_plugin().with_max_block_depth(depth)),
                Box::new(go::go_plugin().with_max_block_depth(depth)),
            ],
        }
    }

    /// Register an additional plugin (e.g. an LSP-backed one).
    pub fn register(&mut self, plugin: Box<dyn LanguagePlugin>) {
        self.plugins.push(plugin);
    }

    /// Find the plugin claiming this path's extension.
    pub fn for_path(&self, file_path: &Path) -> Option<&dyn LanguagePlugin> {
        let extension = file_path.extension()?.to_str()?.to_lowercase();
        let with_dot = format!(".{}", extension);
        self.plugins
            .iter()
            .find(|plugin| plugin.file_extensions().contains(&with_dot.as_str()))
            .map(|boxed| &**boxed)
    }

    /// Find a plugin by its language id.
    pub fn for_language(&self, language_id: &str) -> Option<&dyn LanguagePlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.language_id() == language_id)
            .map(|boxed| &**boxed)
    }

    /// All registered language ids, in registration order.
    pub fn language_ids(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.language_id()).collect()
    }

    /// Union of all claimed extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .flat_map(|p| p.file_extensions().iter().copied())
            .collect()
    }

    /// Union of all skip dirs, sorted and deduplicated.
    pub fn skip_dirs(&self) -> Vec<&str> {
        let mut dirs: Vec<&str> = self
            .plugins
            .iter()
            .flat_map(|p| p.skip_dirs().iter().copied())
            .collect();
        dirs.sort_unstable();
        dirs.dedup();
        dirs
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
