//! CLI commands

pub mod analyze;
pub mod check;
pub mod compare;
pub mod suppress;

use anyhow::Result;
use astrograph_core::{AnalysisEngine, AstrographConfig};
use std::path::Path;

/// Build an engine rooted at `root`, honoring any `.astrograph.toml` found
/// in the root or its ancestors.
pub(crate) fn engine_for(root: &Path) -> Result<AnalysisEngine> {
    let config = AstrographConfig::find_and_load(root)?;
    Ok(AnalysisEngine::new(root, config))
}
