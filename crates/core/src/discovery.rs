//! Corpus discovery with gitignore-aware filtering
//!
//! Uses the `ignore` crate (from ripgrep) so `.gitignore`, `.ignore`, and
//! `.git/info/exclude` are respected automatically. Plugin skip dirs
//! (ecosystem build output) are pruned on top.

use crate::plugin::PluginRegistry;
use anyhow::Result;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Discover source files under `root` claimed by the registry, restricted to
/// `languages` when given, skipping plugin skip-dirs and `ignore_patterns`.
///
/// Returns absolute paths sorted alphabetically.
pub fn discover_files(
    root: &Path,
    registry: &PluginRegistry,
    languages: Option<&[String]>,
    ignore_patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize()?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let mut overrides = OverrideBuilder::new(&root);
    // Skip dirs are plain directory names that may appear at any depth.
    for dir in registry.skip_dirs() {
        overrides.add(&format!("!**/{}/**", dir))?;
    }
    // Config ignore patterns use gitignore syntax; negate so they exclude.
    for pattern in ignore_patterns {
        let glob = if pattern.ends_with('/') {
            format!("!{}**", pattern)
        } else {
            format!("!{}", pattern)
        };
        overrides.add(&glob)?;
    }
    builder.overrides(overrides.build()?);

    let extensions = allowed_extensions(registry, languages);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue, // skip unreadable entries
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.into_path();
        if has_supported_extension(&path, &extensions) {
            if path.is_absolute() {
                files.push(path);
            } else {
                files.push(root.join(path));
            }
        }
    }

    files.sort();
    Ok(files)
}

fn allowed_extensions<'a>(
    registry: &'a PluginRegistry,
    languages: Option<&[String]>,
) -> Vec<&'a str> {
    match languages {
        None => registry.supported_extensions(),
        Some(ids) => ids
            .iter()
            .filter_map(|id| registry.for_language(id))
            .flat_map(|plugin| plugin.file_extensions().iter().copied())
            .collect(),
    }
}

fn has_supported_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };
    let with_dot = format!(".{}", ext);
    extensions.contains(&with_dot.as_str())
}
