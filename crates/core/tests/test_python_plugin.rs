//! Integration tests for the Python plugin
//!
//! Verifies unit extraction (functions, methods, classes, blocks), the
//! labeling discipline, and the import-only filter against real Python
//! source.

use astrograph_core::plugin::python::python_plugin;
use astrograph_core::plugin::{LanguagePlugin, PluginError};
use astrograph_core::unit::{CodeUnit, UnitKind, ANONYMOUS};
use std::path::Path;

fn extract(source: &str) -> Vec<CodeUnit> {
    python_plugin()
        .extract_code_units(source.as_bytes(), Path::new("test.py"))
        .expect("extraction should succeed")
}

#[test]
fn test_extract_functions_and_classes() {
    let source = r#"
def func1(x):
    return x + 1

def func2(y):
    return y * 2

class MyClass:
    def method1(self):
        pass
"#;
    let units = extract(source);
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();

    assert!(names.contains(&"func1"));
    assert!(names.contains(&"func2"));
    assert!(names.contains(&"MyClass"));
    assert!(names.contains(&"method1"));
}

#[test]
fn test_method_parent_tracking() {
    let source = r#"
class Calculator:
    def add(self, a, b):
        return a + b

    def subtract(self, a, b):
        return a - b
"#;
    let units = extract(source);
    let methods: Vec<&CodeUnit> = units
        .iter()
        .filter(|u| u.kind == UnitKind::Function)
        .collect();

    assert_eq!(methods.len(), 2);
    assert!(methods
        .iter()
        .all(|m| m.parent_name.as_deref() == Some("Calculator")));
}

#[test]
fn test_line_numbers_one_based_inclusive() {
    let source = "def func1():\n    pass\n\ndef func2():\n    x = 1\n    return x\n";
    let units = extract(source);

    let func1 = units.iter().find(|u| u.name == "func1").unwrap();
    let func2 = units.iter().find(|u| u.name == "func2").unwrap();

    assert_eq!(func1.start_line, 1);
    assert_eq!(func1.end_line, 2);
    assert_eq!(func2.start_line, 4);
    assert_eq!(func2.end_line, 6);
}

#[test]
fn test_async_function_extracted() {
    let source = "async def fetch(url):\n    return await get(url)\n";
    let units = extract(source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, "fetch");
    assert_eq!(units[0].kind, UnitKind::Function);
}

#[test]
fn test_lambda_is_anonymous() {
    let source = "handler = lambda event: event + 1\n";
    let units = extract(source);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, ANONYMOUS);
}

#[test]
fn test_syntax_error_is_parse_failure() {
    let plugin = python_plugin();
    let result = plugin.extract_code_units(b"def f( broken", Path::new("bad.py"));
    assert!(matches!(result, Err(PluginError::ParseFailure(_))));
}

#[test]
fn test_invalid_utf8_is_unsupported_encoding() {
    let plugin = python_plugin();
    let result = plugin.extract_code_units(&[0xff, 0xfe, 0x00], Path::new("bad.py"));
    assert!(matches!(result, Err(PluginError::UnsupportedEncoding(_))));
}

#[test]
fn test_node_count_positive() {
    let units = extract("def f(a):\n    return a + 1\n");
    assert_eq!(units.len(), 1);
    assert!(units[0].node_count >= 5);
}

// ── blocks ──────────────────────────────────────────────────────

#[test]
fn test_basic_for_loop_block() {
    let source = r#"
def func():
    for i in range(10):
        print(i)
"#;
    let units = extract(source);
    let blocks: Vec<&CodeUnit> = units.iter().filter(|u| u.kind == UnitKind::Block).collect();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name, "func.for_1");
    assert_eq!(blocks[0].block_type.as_deref(), Some("for"));
    assert_eq!(blocks[0].parent_name.as_deref(), Some("func"));
}

#[test]
fn test_multiple_blocks_same_level() {
    let source = r#"
def func():
    for i in range(10):
        pass
    for j in range(5):
        pass
    if True:
        pass
"#;
    let units = extract(source);
    let names: Vec<&str> = units
        .iter()
        .filter(|u| u.kind == UnitKind::Block)
        .map(|u| u.name.as_str())
        .collect();

    assert_eq!(names.len(), 3);
    assert!(names.contains(&"func.for_1"));
    assert!(names.contains(&"func.for_2"));
    assert!(names.contains(&"func.if_1"));
}

#[test]
fn test_nested_blocks_hierarchical_names() {
    let source = r#"
def func():
    for i in range(10):
        if i > 5:
            while True:
                break
"#;
    let units = extract(source);
    let names: Vec<&str> = units
        .iter()
        .filter(|u| u.kind == UnitKind::Block)
        .map(|u| u.name.as_str())
        .collect();

    assert_eq!(names.len(), 3);
    assert!(names.contains(&"func.for_1"));
    assert!(names.contains(&"func.for_1.if_1"));
    assert!(names.contains(&"func.for_1.if_1.while_1"));
}

#[test]
fn test_max_block_depth_limit() {
    let source = r#"
def func():
    for i in range(10):
        if i > 5:
            while True:
                pass
"#;
    let plugin = python_plugin().with_max_block_depth(2);
    let units = plugin
        .extract_code_units(source.as_bytes(), Path::new("test.py"))
        .unwrap();
    let blocks: Vec<&CodeUnit> = units.iter().filter(|u| u.kind == UnitKind::Block).collect();

    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| !b.name.contains("while")));
}

#[test]
fn test_all_block_types() {
    let source = r#"
def func():
    for i in range(10):
        pass
    while True:
        break
    if True:
        pass
    try:
        pass
    except Exception:
        pass
    with open('f') as f:
        pass
"#;
    let units = extract(source);
    let types: Vec<&str> = units
        .iter()
        .filter_map(|u| u.block_type.as_deref())
        .collect();

    for expected in ["for", "while", "if", "try", "with"] {
        assert!(types.contains(&expected), "missing block type {}", expected);
    }
}

#[test]
fn test_async_block_types() {
    let source = r#"
async def func():
    async for i in aiter():
        pass
    async with aopen('f') as f:
        pass
"#;
    let units = extract(source);
    let types: Vec<&str> = units
        .iter()
        .filter_map(|u| u.block_type.as_deref())
        .collect();

    assert!(types.contains(&"async_for"));
    assert!(types.contains(&"async_with"));
}

#[test]
fn test_blocks_from_method_named_after_method() {
    let source = r#"
class MyClass:
    def method(self):
        for i in range(10):
            pass
"#;
    let units = extract(source);
    let blocks: Vec<&CodeUnit> = units.iter().filter(|u| u.kind == UnitKind::Block).collect();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name, "method.for_1");
}

#[test]
fn test_nested_function_blocks_scoped_to_inner() {
    let source = r#"
def outer():
    def inner():
        for i in range(3):
            pass
    return inner
"#;
    let units = extract(source);
    let blocks: Vec<&CodeUnit> = units.iter().filter(|u| u.kind == UnitKind::Block).collect();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name, "inner.for_1");
}

// ── graph construction ──────────────────────────────────────────

#[test]
fn test_rename_invariant_graphs() {
    let plugin = python_plugin();
    let g1 = plugin
        .source_to_graph(b"def add(a, b):\n    return a + b\n")
        .unwrap();
    let g2 = plugin
        .source_to_graph(b"def sum_values(x, y):\n    return x + y\n")
        .unwrap();

    let labels = |g: &astrograph_core::LabeledGraph| {
        g.nodes().map(|(_, n)| n.label().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(labels(&g1), labels(&g2));
}

#[test]
fn test_literal_values_do_not_change_structure() {
    let plugin = python_plugin();
    let g1 = plugin.source_to_graph(b"x = 'hello'\n").unwrap();
    let g2 = plugin.source_to_graph(b"x = 'a much longer string value'\n").unwrap();
    assert_eq!(g1.node_count(), g2.node_count());
}

#[test]
fn test_graph_has_single_root() {
    let plugin = python_plugin();
    let graph = plugin.source_to_graph(b"x = 1\n").unwrap();
    assert!(graph.root().is_some());
    assert!(graph.node_count() >= 2);
    assert_eq!(graph.edge_count(), graph.node_count() - 1);
}
