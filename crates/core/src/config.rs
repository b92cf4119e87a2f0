//! Configuration file parsing for .astrograph.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for .astrograph.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstrographConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Languages to analyze (all registered plugins if empty)
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum subgraph size for exact and pattern duplicate groups
    #[serde(default = "default_min_node_count_exact")]
    pub min_node_count_exact: usize,

    /// Minimum subgraph size for block duplicate groups
    #[serde(default = "default_min_node_count_block")]
    pub min_node_count_block: usize,

    /// Minimum line span for block duplicate groups
    #[serde(default = "default_min_block_lines")]
    pub min_block_lines: usize,

    /// Extract control-flow blocks in addition to functions and classes
    #[serde(default = "default_true")]
    pub include_blocks: bool,

    /// Maximum nesting depth for block extraction
    #[serde(default = "default_max_block_depth")]
    pub max_block_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Paths to ignore (gitignore syntax)
    #[serde(default = "default_ignore_paths")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the persistent index, suppressions, and reports
    #[serde(default = "default_index_dir")]
    pub dir: String,
}

fn default_min_node_count_exact() -> usize {
    5
}

fn default_min_node_count_block() -> usize {
    10
}

fn default_min_block_lines() -> usize {
    3
}

fn default_max_block_depth() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_ignore_paths() -> Vec<String> {
    vec![".git/".to_string(), ".metadata_astrograph/".to_string()]
}

fn default_index_dir() -> String {
    ".metadata_astrograph".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_node_count_exact: default_min_node_count_exact(),
            min_node_count_block: default_min_node_count_block(),
            min_block_lines: default_min_block_lines(),
            include_blocks: true,
            max_block_depth: default_max_block_depth(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            paths: default_ignore_paths(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

impl AstrographConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AstrographConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Find and load .astrograph.toml from the given directory or ancestors
    pub fn find_and_load(start_dir: &Path) -> Result<Self> {
        let mut current = start_dir;

        loop {
            let config_path = current.join(".astrograph.toml");
            if config_path.exists() {
                return Self::from_file(&config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: AstrographConfig = toml::from_str("").unwrap();
        assert_eq!(config.analysis.min_node_count_exact, 5);
        assert_eq!(config.analysis.min_node_count_block, 10);
        assert_eq!(config.analysis.min_block_lines, 3);
        assert!(config.analysis.include_blocks);
        assert_eq!(config.index.dir, ".metadata_astrograph");
    }

    #[test]
    fn test_partial_override() {
        let config: AstrographConfig =
            toml::from_str("[analysis]\nmin_node_count_exact = 8\ninclude_blocks = false\n")
                .unwrap();
        assert_eq!(config.analysis.min_node_count_exact, 8);
        assert!(!config.analysis.include_blocks);
        assert_eq!(config.analysis.min_node_count_block, 10);
    }
}
