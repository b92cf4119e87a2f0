//! Terminal and JSON rendering of engine results

use anyhow::Result;
use astrograph_core::{AnalysisOutcome, ClusterKind, PreCreateFinding};
use colored::Colorize;
use serde_json::json;
use std::path::Path;

pub(crate) fn print_analysis(outcome: &AnalysisOutcome) {
    let summary = &outcome.summary;

    if outcome.clusters.is_empty() {
        println!(
            "{} no duplicates above thresholds ({} files, {} units)",
            "clean:".green().bold(),
            summary.files_analyzed,
            summary.units_indexed
        );
    } else {
        for cluster in &outcome.clusters {
            let heading = format!(
                "{} {} ({} nodes, {} lines, {})",
                cluster.kind, cluster.digest, cluster.node_count, cluster.line_count,
                cluster.language_id
            );
            let heading = match cluster.kind {
                ClusterKind::Exact => heading.red().bold(),
                ClusterKind::Pattern => heading.yellow().bold(),
                ClusterKind::Block => heading.magenta().bold(),
            };
            println!("{}", heading);
            for unit in &cluster.units {
                println!("    {}  {}", unit.location(), unit.name.as_str().dimmed());
            }
        }
        println!(
            "\n{} exact={} pattern={} block={} suppressed={}",
            "clusters:".bold(),
            summary.exact_clusters,
            summary.pattern_clusters,
            summary.block_clusters,
            summary.suppressed_clusters
        );
    }

    for warning in &summary.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    println!("report: {}", outcome.report_path.display());
}

pub(crate) fn print_analysis_json(outcome: &AnalysisOutcome) -> Result<()> {
    let clusters: Vec<_> = outcome
        .clusters
        .iter()
        .map(|cluster| {
            json!({
                "key": cluster.cluster_key(),
                "kind": cluster.kind.to_string(),
                "digest": cluster.digest.to_string(),
                "language": cluster.language_id,
                "node_count": cluster.node_count,
                "line_count": cluster.line_count,
                "units": cluster.units.iter().map(|unit| {
                    json!({
                        "file": unit.file_path,
                        "name": unit.name,
                        "start_line": unit.start_line,
                        "end_line": unit.end_line,
                    })
                }).collect::<Vec<_>>(),
            })
        })
        .collect();

    let doc = json!({
        "report_path": outcome.report_path,
        "duplicate_groups": clusters,
        "summary": {
            "files_analyzed": outcome.summary.files_analyzed,
            "units_indexed": outcome.summary.units_indexed,
            "exact_clusters": outcome.summary.exact_clusters,
            "pattern_clusters": outcome.summary.pattern_clusters,
            "block_clusters": outcome.summary.block_clusters,
            "suppressed_clusters": outcome.summary.suppressed_clusters,
            "warnings": outcome.summary.warnings,
        },
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

pub(crate) fn print_findings(file: &Path, findings: &[PreCreateFinding]) {
    if findings.is_empty() {
        println!(
            "{} {} has no significant duplicates in the index",
            "clean:".green().bold(),
            file.display()
        );
        return;
    }

    for finding in findings {
        let tag = match finding.kind {
            ClusterKind::Exact => "exact duplicate".red().bold(),
            _ => "pattern duplicate".yellow().bold(),
        };
        println!(
            "{} {} ({} nodes) at {}",
            tag, finding.unit_name, finding.node_count, finding.unit_location
        );
        for existing in &finding.existing {
            println!("    already exists: {}", existing);
        }
    }
}

pub(crate) fn print_findings_json(findings: &[PreCreateFinding]) -> Result<()> {
    let matches: Vec<_> = findings
        .iter()
        .map(|finding| {
            json!({
                "kind": finding.kind.to_string(),
                "unit": finding.unit_name,
                "location": finding.unit_location,
                "node_count": finding.node_count,
                "digest": finding.digest.to_string(),
                "existing": finding.existing,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "matches": matches }))?
    );
    Ok(())
}
