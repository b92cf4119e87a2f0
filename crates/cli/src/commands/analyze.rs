//! `astrograph analyze` - full duplicate analysis of a source tree

use super::engine_for;
use crate::output;
use anyhow::Result;
use astrograph_core::{AnalysisOptions, CancelToken};
use std::path::Path;

pub(crate) struct AnalyzeArgs {
    pub min_nodes: Option<usize>,
    pub min_block_nodes: Option<usize>,
    pub min_block_lines: Option<usize>,
    pub no_blocks: bool,
    pub language: Option<Vec<String>>,
    pub json: bool,
}

pub(crate) fn run(root: &Path, args: AnalyzeArgs) -> Result<i32> {
    let engine = engine_for(root)?;

    let mut options = AnalysisOptions::from_config(engine.config());
    if let Some(min_nodes) = args.min_nodes {
        options.min_node_count_exact = min_nodes;
    }
    if let Some(min_block_nodes) = args.min_block_nodes {
        options.min_node_count_block = min_block_nodes;
    }
    if let Some(min_block_lines) = args.min_block_lines {
        options.min_block_lines = min_block_lines;
    }
    if args.no_blocks {
        options.include_blocks = false;
    }
    if args.language.is_some() {
        options.languages = args.language;
    }

    let outcome = engine.analyze(&options, &CancelToken::new())?;

    if args.json {
        output::print_analysis_json(&outcome)?;
    } else {
        output::print_analysis(&outcome);
    }

    // Unsuppressed duplicates fail the invocation, so CI can gate on it.
    Ok(if outcome.clusters.is_empty() { 0 } else { 1 })
}
