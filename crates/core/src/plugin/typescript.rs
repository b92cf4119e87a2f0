//! TypeScript and TSX grammar hooks
//!
//! One hooks type serves both dialects; the grammar handle and claimed
//! extensions differ per instance.

use super::treesitter::{structural_label, GrammarHooks, TreeSitterPlugin};
use tree_sitter::{Language, Node};

const IDENTIFIERS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "type_identifier",
    "private_property_identifier",
];

const LITERALS: &[&str] = &[
    "string",
    "template_string",
    "number",
    "true",
    "false",
    "null",
    "undefined",
    "regex",
];

const OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "==", "===", "!=", "!==", "<", "<=", ">", ">=", "&&", "||",
    "??", "!", "~", "&", "|", "^", "<<", ">>", ">>>", "+=", "-=", "*=", "/=", "%=", "**=", "&=",
    "|=", "^=", "<<=", ">>=", ">>>=", "&&=", "||=", "??=", "++", "--", "instanceof", "in",
    "typeof",
];

const FUNCTIONS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

const CLASSES: &[&str] = &["class_declaration", "class", "abstract_class_declaration"];

const BLOCKS: &[&str] = &[
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "if_statement",
    "try_statement",
    "switch_statement",
];

pub struct TypeScriptHooks {
    language_id: &'static str,
    extensions: &'static [&'static str],
    grammar: Language,
}

impl GrammarHooks for TypeScriptHooks {
    fn grammar(&self) -> Language {
        self.grammar.clone()
    }

    fn language_id(&self) -> &'static str {
        self.language_id
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn skip_dirs(&self) -> &'static [&'static str] {
        &["node_modules", "dist", "build", ".next", "coverage"]
    }

    fn node_label(&self, node: &Node, _source: &[u8], normalize_ops: bool) -> String {
        structural_label(node, IDENTIFIERS, LITERALS, OPERATORS, normalize_ops)
    }

    fn is_function_node(&self, node: &Node) -> bool {
        FUNCTIONS.contains(&node.kind())
    }

    fn is_class_node(&self, node: &Node) -> bool {
        CLASSES.contains(&node.kind())
    }

    fn node_name(&self, node: &Node, source: &[u8]) -> Option<String> {
        let name = node.child_by_field_name("name")?;
        name.utf8_text(source).ok().map(String::from)
    }

    fn is_block_node(&self, node: &Node) -> bool {
        BLOCKS.contains(&node.kind())
    }

    fn block_type(&self, node: &Node) -> String {
        node.kind().trim_end_matches("_statement").to_string()
    }
}

/// Plugin for `.ts` and plain JavaScript sources.
pub fn typescript_plugin() -> TreeSitterPlugin<TypeScriptHooks> {
    TreeSitterPlugin::new(TypeScriptHooks {
        language_id: "typescript",
        extensions: &[".ts", ".js", ".mjs", ".cjs"],
        grammar: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    })
}

/// Plugin for `.tsx`/`.jsx` sources, bound to the TSX grammar.
pub fn tsx_plugin() -> TreeSitterPlugin<TypeScriptHooks> {
    TreeSitterPlugin::new(TypeScriptHooks {
        language_id: "tsx",
        extensions: &[".tsx", ".jsx"],
        grammar: tree_sitter_typescript::LANGUAGE_TSX.into(),
    })
}
