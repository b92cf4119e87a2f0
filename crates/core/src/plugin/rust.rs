//! Rust grammar hooks

use super::treesitter::{structural_label, GrammarHooks, TreeSitterPlugin};
use tree_sitter::{Language, Node};

const IDENTIFIERS: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "shorthand_field_identifier",
];

const LITERALS: &[&str] = &[
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "integer_literal",
    "float_literal",
    "boolean_literal",
    "byte_literal",
    "byte_string_literal",
];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "!", "&", "|", "^",
    "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "as",
];

const CLASSES: &[&str] = &["struct_item", "enum_item", "trait_item", "impl_item"];

const BLOCKS: &[&str] = &[
    "for_expression",
    "while_expression",
    "loop_expression",
    "if_expression",
    "match_expression",
];

pub struct RustHooks;

impl GrammarHooks for RustHooks {
    fn grammar(&self) -> Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &[".rs"]
    }

    fn skip_dirs(&self) -> &'static [&'static str] {
        &["target"]
    }

    fn node_label(&self, node: &Node, _source: &[u8], normalize_ops: bool) -> String {
        structural_label(node, IDENTIFIERS, LITERALS, OPERATORS, normalize_ops)
    }

    fn is_function_node(&self, node: &Node) -> bool {
        matches!(node.kind(), "function_item" | "closure_expression")
    }

    fn is_class_node(&self, node: &Node) -> bool {
        CLASSES.contains(&node.kind())
    }

    fn node_name(&self, node: &Node, source: &[u8]) -> Option<String> {
        // impl blocks have no name field; the implemented type stands in.
        let name = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("type"))?;
        name.utf8_text(source).ok().map(String::from)
    }

    fn is_block_node(&self, node: &Node) -> bool {
        BLOCKS.contains(&node.kind())
    }

    fn block_type(&self, node: &Node) -> String {
        node.kind().trim_end_matches("_expression").to_string()
    }
}

pub fn rust_plugin() -> TreeSitterPlugin<RustHooks> {
    TreeSitterPlugin::new(RustHooks)
}
