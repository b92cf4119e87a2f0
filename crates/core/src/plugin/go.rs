//! Go grammar hooks

use super::treesitter::{structural_label, GrammarHooks, TreeSitterPlugin};
use tree_sitter::{Language, Node};

const IDENTIFIERS: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "package_identifier",
    "blank_identifier",
    "label_name",
];

const LITERALS: &[&str] = &[
    "interpreted_string_literal",
    "raw_string_literal",
    "int_literal",
    "float_literal",
    "imaginary_literal",
    "rune_literal",
    "true",
    "false",
    "nil",
    "iota",
];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "!", "&", "|", "^",
    "<<", ">>", "&^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "&^=",
];

const BLOCKS: &[&str] = &[
    "for_statement",
    "if_statement",
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
];

pub struct GoHooks;

impl GrammarHooks for GoHooks {
    fn grammar(&self) -> Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn language_id(&self) -> &'static str {
        "go"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn skip_dirs(&self) -> &'static [&'static str] {
        &["vendor"]
    }

    fn node_label(&self, node: &Node, _source: &[u8], normalize_ops: bool) -> String {
        structural_label(node, IDENTIFIERS, LITERALS, OPERATORS, normalize_ops)
    }

    fn is_function_node(&self, node: &Node) -> bool {
        matches!(
            node.kind(),
            "function_declaration" | "method_declaration" | "func_literal"
        )
    }

    fn is_class_node(&self, node: &Node) -> bool {
        node.kind() == "type_spec"
    }

    fn node_name(&self, node: &Node, source: &[u8]) -> Option<String> {
        let name = node.child_by_field_name("name")?;
        name.utf8_text(source).ok().map(String::from)
    }

    fn is_block_node(&self, node: &Node) -> bool {
        BLOCKS.contains(&node.kind())
    }

    fn block_type(&self, node: &Node) -> String {
        match node.kind() {
            "expression_switch_statement" => "switch".to_string(),
            "type_switch_statement" => "type_switch".to_string(),
            other => other.trim_end_matches("_statement").to_string(),
        }
    }
}

pub fn go_plugin() -> TreeSitterPlugin<GoHooks> {
    TreeSitterPlugin::new(GoHooks)
}
