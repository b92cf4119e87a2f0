//! Python grammar hooks

use super::treesitter::{structural_label, GrammarHooks, TreeSitterPlugin};
use tree_sitter::{Language, Node};

const IDENTIFIERS: &[&str] = &["identifier"];

const LITERALS: &[&str] = &["string", "integer", "float", "true", "false", "none", "ellipsis"];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "//", "%", "**", "==", "!=", "<", "<=", ">", ">=", "<>", "and", "or",
    "not", "in", "not in", "is", "is not", "&", "|", "^", "<<", ">>", "@", ":=", "+=", "-=",
    "*=", "/=", "//=", "%=", "**=", "&=", "|=", "^=", "<<=", ">>=", "@=",
];

const BLOCKS: &[&str] = &[
    "for_statement",
    "while_statement",
    "if_statement",
    "try_statement",
    "with_statement",
];

pub struct PythonHooks;

impl GrammarHooks for PythonHooks {
    fn grammar(&self) -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn language_id(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &[".py", ".pyi"]
    }

    fn skip_dirs(&self) -> &'static [&'static str] {
        &[
            "__pycache__",
            ".venv",
            "venv",
            ".tox",
            ".mypy_cache",
            ".pytest_cache",
            "site-packages",
            ".eggs",
        ]
    }

    fn node_label(&self, node: &Node, _source: &[u8], normalize_ops: bool) -> String {
        structural_label(node, IDENTIFIERS, LITERALS, OPERATORS, normalize_ops)
    }

    fn is_function_node(&self, node: &Node) -> bool {
        matches!(node.kind(), "function_definition" | "lambda")
    }

    fn is_class_node(&self, node: &Node) -> bool {
        node.kind() == "class_definition"
    }

    fn node_name(&self, node: &Node, source: &[u8]) -> Option<String> {
        let name = node.child_by_field_name("name")?;
        name.utf8_text(source).ok().map(String::from)
    }

    fn is_block_node(&self, node: &Node) -> bool {
        BLOCKS.contains(&node.kind())
    }

    fn block_type(&self, node: &Node) -> String {
        let base = node.kind().trim_end_matches("_statement");
        // `async for` / `async with` keep the async marker, matching the
        // distinct control flow they represent.
        let is_async = node
            .child(0)
            .map(|first| first.kind() == "async")
            .unwrap_or(false);
        if is_async {
            format!("async_{}", base)
        } else {
            base.to_string()
        }
    }
}

/// Python plugin with the default block depth.
pub fn python_plugin() -> TreeSitterPlugin<PythonHooks> {
    TreeSitterPlugin::new(PythonHooks)
}
