//! Timestamped text report artifacts

use crate::duplicates::DuplicateCluster;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Inputs the reporter renders
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub clusters: Vec<DuplicateCluster>,
    /// Recovered per-file failures accumulated during the run.
    pub warnings: Vec<String>,
    pub files_analyzed: usize,
    pub units_indexed: usize,
    pub suppressed_clusters: usize,
}

/// Write a report artifact under `dir` and return its absolute path.
///
/// The filename carries the run timestamp
/// (`analysis_report_<YYYYMMDD>_<HHMMSS>_<microseconds>.txt`); no stable
/// alias is produced. Everything after the header line is a deterministic
/// function of the input.
pub fn write_report(dir: &Path, input: &ReportInput) -> Result<PathBuf> {
    let now = Utc::now();
    write_report_at(dir, input, now)
}

pub(crate) fn write_report_at(
    dir: &Path,
    input: &ReportInput,
    timestamp: DateTime<Utc>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating report directory {}", dir.display()))?;

    let filename = format!(
        "analysis_report_{}.txt",
        timestamp.format("%Y%m%d_%H%M%S_%6f")
    );
    let path = dir.join(filename);

    let body = render(input, timestamp);
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;

    let path = path
        .canonicalize()
        .unwrap_or(path);
    Ok(path)
}

fn render(input: &ReportInput, timestamp: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "astrograph {} analysis report ({})",
        crate::VERSION,
        timestamp.to_rfc3339()
    );
    out.push('\n');

    for kind in ["exact", "pattern", "block"] {
        let _ = writeln!(out, "== {} duplicates ==", kind);
        let clusters: Vec<&DuplicateCluster> = input
            .clusters
            .iter()
            .filter(|c| c.kind.to_string() == kind)
            .collect();
        if clusters.is_empty() {
            out.push_str("(none)\n\n");
            continue;
        }
        for cluster in clusters {
            let _ = writeln!(
                out,
                "cluster {} kind={} nodes={} lines={} language={}",
                cluster.digest, cluster.kind, cluster.node_count, cluster.line_count,
                cluster.language_id
            );
            for unit in &cluster.units {
                let _ = writeln!(out, "  {} {}", unit.location(), unit.name);
            }
            out.push('\n');
        }
    }

    let _ = writeln!(out, "== warnings ==");
    if input.warnings.is_empty() {
        out.push_str("(none)\n");
    } else {
        for warning in &input.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }
    out.push('\n');

    let exact = count_kind(input, "exact");
    let pattern = count_kind(input, "pattern");
    let block = count_kind(input, "block");
    let _ = writeln!(out, "== summary ==");
    let _ = writeln!(out, "files analyzed: {}", input.files_analyzed);
    let _ = writeln!(out, "units indexed: {}", input.units_indexed);
    let _ = writeln!(
        out,
        "clusters: exact={} pattern={} block={}",
        exact, pattern, block
    );
    let _ = writeln!(out, "suppressed clusters: {}", input.suppressed_clusters);

    out
}

fn count_kind(input: &ReportInput, kind: &str) -> usize {
    input
        .clusters
        .iter()
        .filter(|c| c.kind.to_string() == kind)
        .count()
}
