//! `astrograph check` - pre-create duplicate check of one file

use super::engine_for;
use crate::output;
use anyhow::{Context, Result};
use astrograph_core::ClusterKind;
use std::path::Path;

pub(crate) fn run(root: &Path, file: &Path, json: bool) -> Result<i32> {
    let engine = engine_for(root)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let findings = engine.check_content(file, &content)?;

    if json {
        output::print_findings_json(&findings)?;
    } else {
        output::print_findings(file, &findings);
    }

    let blocking = findings.iter().any(|f| f.kind == ClusterKind::Exact);
    Ok(if blocking { 1 } else { 0 })
}
