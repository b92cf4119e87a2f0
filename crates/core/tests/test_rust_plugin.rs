//! Integration tests for the Rust plugin

use astrograph_core::plugin::rust::rust_plugin;
use astrograph_core::plugin::LanguagePlugin;
use astrograph_core::unit::{CodeUnit, UnitKind};
use std::path::Path;

fn extract(source: &str) -> Vec<CodeUnit> {
    rust_plugin()
        .extract_code_units(source.as_bytes(), Path::new("test.rs"))
        .expect("extraction should succeed")
}

#[test]
fn test_extract_items() {
    let source = r#"
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

enum Shape {
    Circle,
    Square,
}

trait Draw {
    fn draw(&self);
}

fn free_function(v: u32) -> u32 {
    v + 1
}
"#;
    let units = extract(source);
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();

    assert!(names.contains(&"Point"));
    assert!(names.contains(&"Shape"));
    assert!(names.contains(&"Draw"));
    assert!(names.contains(&"free_function"));
    assert!(names.contains(&"length"));

    let length = units.iter().find(|u| u.name == "length").unwrap();
    assert_eq!(length.kind, UnitKind::Function);
    assert_eq!(length.parent_name.as_deref(), Some("Point"));
}

#[test]
fn test_impl_unit_named_after_type() {
    let source = "struct S;\nimpl S {\n    fn a(&self) {}\n}\n";
    let units = extract(source);
    let classes: Vec<&CodeUnit> = units.iter().filter(|u| u.kind == UnitKind::Class).collect();
    assert!(classes.iter().filter(|u| u.name == "S").count() >= 2);
}

#[test]
fn test_expression_blocks() {
    let source = r#"
fn process(values: &[i32]) -> i32 {
    let mut total = 0;
    for value in values {
        if *value > 0 {
            total += value;
        }
    }
    match total {
        0 => -1,
        other => other,
    }
}
"#;
    let units = extract(source);
    let names: Vec<&str> = units
        .iter()
        .filter(|u| u.kind == UnitKind::Block)
        .map(|u| u.name.as_str())
        .collect();

    assert!(names.contains(&"process.for_1"));
    assert!(names.contains(&"process.for_1.if_1"));
    assert!(names.contains(&"process.match_1"));
}

#[test]
fn test_operator_identity_preserved_in_exact_labels() {
    let plugin = rust_plugin();
    let add = plugin.source_to_graph(b"fn f(a: i32, b: i32) -> i32 { a + b }\n").unwrap();
    let sub = plugin.source_to_graph(b"fn f(a: i32, b: i32) -> i32 { a - b }\n").unwrap();

    let has_label = |g: &astrograph_core::LabeledGraph, wanted: &str| {
        g.nodes().any(|(_, n)| n.label() == wanted)
    };
    assert!(has_label(&add, "+"));
    assert!(has_label(&sub, "-"));
    // Pattern labels collapse both to the same generic class.
    let pattern_labels = |g: &astrograph_core::LabeledGraph| {
        let mut labels: Vec<String> =
            g.nodes().map(|(_, n)| n.pattern_label().to_string()).collect();
        labels.sort();
        labels
    };
    assert_eq!(pattern_labels(&add), pattern_labels(&sub));
}

#[test]
fn test_syntax_error_rejected() {
    let plugin = rust_plugin();
    assert!(plugin.source_to_graph(b"fn broken( {").is_err());
}
