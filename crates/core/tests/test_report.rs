//! Report artifact naming and layout

use astrograph_core::duplicates::{ClusterKind, DuplicateCluster};
use astrograph_core::fingerprint::Digest;
use astrograph_core::report::{write_report, ReportInput};
use astrograph_core::unit::{CodeUnit, UnitKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_cluster() -> DuplicateCluster {
    let unit = |file: &str, name: &str| CodeUnit {
        kind: UnitKind::Function,
        name: name.to_string(),
        language_id: "python".to_string(),
        file_path: PathBuf::from(file),
        start_line: 1,
        end_line: 3,
        node_count: 9,
        source_text: "def f():\n    pass".to_string(),
        extracted_code: "def f(): pass".to_string(),
        block_type: None,
        parent_name: None,
    };
    DuplicateCluster {
        kind: ClusterKind::Exact,
        digest: Digest::of_bytes(b"cluster"),
        language_id: "python".to_string(),
        node_count: 9,
        line_count: 3,
        units: vec![unit("src/a.py", "f"), unit("src/b.py", "g")],
    }
}

#[test]
fn test_filename_shape() {
    let dir = TempDir::new().unwrap();
    let path = write_report(dir.path(), &ReportInput::default()).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("analysis_report_"));
    assert!(name.ends_with(".txt"));

    // analysis_report_<YYYYMMDD>_<HHMMSS>_<microseconds>.txt
    let stem = name
        .strip_prefix("analysis_report_")
        .unwrap()
        .strip_suffix(".txt")
        .unwrap();
    let parts: Vec<&str> = stem.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].len(), 8);
    assert_eq!(parts[1].len(), 6);
    assert_eq!(parts[2].len(), 6);
    assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
}

#[test]
fn test_header_and_sections() {
    let dir = TempDir::new().unwrap();
    let input = ReportInput {
        clusters: vec![sample_cluster()],
        warnings: vec!["src/broken.py: failed to parse source".to_string()],
        files_analyzed: 3,
        units_indexed: 5,
        suppressed_clusters: 1,
    };
    let path = write_report(dir.path(), &input).unwrap();
    let text = fs::read_to_string(&path).unwrap();

    let header = text.lines().next().unwrap();
    assert!(header.starts_with(&format!("astrograph {}", astrograph_core::VERSION)));

    assert!(text.contains("== exact duplicates =="));
    assert!(text.contains("== pattern duplicates =="));
    assert!(text.contains("== block duplicates =="));
    assert!(text.contains("src/a.py:1-3 f"));
    assert!(text.contains("src/b.py:1-3 g"));
    assert!(text.contains(&Digest::of_bytes(b"cluster").to_string()));
    assert!(text.contains("== warnings =="));
    assert!(text.contains("src/broken.py"));
    assert!(text.contains("files analyzed: 3"));
    assert!(text.contains("units indexed: 5"));
    assert!(text.contains("clusters: exact=1 pattern=0 block=0"));
    assert!(text.contains("suppressed clusters: 1"));
}

#[test]
fn test_empty_sections_marked_none() {
    let dir = TempDir::new().unwrap();
    let path = write_report(dir.path(), &ReportInput::default()).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("(none)").count(), 4);
}

#[test]
fn test_body_deterministic_for_same_input() {
    let dir = TempDir::new().unwrap();
    let input = ReportInput {
        clusters: vec![sample_cluster()],
        ..Default::default()
    };

    let first = write_report(dir.path(), &input).unwrap();
    let second = write_report(dir.path(), &input).unwrap();

    let body = |p: &std::path::Path| {
        let text = fs::read_to_string(p).unwrap();
        text.splitn(2, '\n').nth(1).unwrap().to_string()
    };
    assert_eq!(body(&first), body(&second));
}

#[test]
fn test_returns_absolute_path() {
    let dir = TempDir::new().unwrap();
    let path = write_report(dir.path(), &ReportInput::default()).unwrap();
    assert!(path.is_absolute());
    assert!(path.exists());
}
