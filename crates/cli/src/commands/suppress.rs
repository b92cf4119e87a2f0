//! `astrograph suppress` / `unsuppress` / `suppressions`

use super::engine_for;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub(crate) fn run_suppress(root: &Path, cluster_key: &str, reason: &str) -> Result<i32> {
    let engine = engine_for(root)?;
    engine.suppress(cluster_key, reason)?;
    println!("{} {}", "Suppressed".green().bold(), cluster_key);
    Ok(0)
}

pub(crate) fn run_unsuppress(root: &Path, cluster_key: &str) -> Result<i32> {
    let engine = engine_for(root)?;
    engine.unsuppress(cluster_key)?;
    println!("{} {}", "Unsuppressed".green().bold(), cluster_key);
    Ok(0)
}

pub(crate) fn run_list(root: &Path, active_only: bool) -> Result<i32> {
    let engine = engine_for(root)?;
    let suppressions = if active_only {
        engine.list_active_suppressions()?
    } else {
        engine.list_suppressions()?
    };

    if suppressions.is_empty() {
        println!("No suppressions recorded.");
        return Ok(0);
    }

    for suppression in &suppressions {
        println!(
            "{}  {} unit(s)  {}  {}",
            suppression.cluster_key.as_str().cyan(),
            suppression.evidence_digests.len(),
            suppression.created_at.format("%Y-%m-%d"),
            suppression.reason.as_str().dimmed()
        );
    }
    Ok(0)
}
