//! `astrograph compare` - structural isomorphism check between two files

use super::engine_for;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub(crate) fn run(root: &Path, file_a: &Path, file_b: &Path) -> Result<i32> {
    let engine = engine_for(root)?;
    let isomorphic = engine.files_isomorphic(file_a, file_b)?;

    if isomorphic {
        println!(
            "{} {} and {} are structurally identical",
            "Isomorphic:".green().bold(),
            file_a.display(),
            file_b.display()
        );
        Ok(0)
    } else {
        println!(
            "{} {} and {} differ structurally",
            "Not isomorphic:".yellow().bold(),
            file_a.display(),
            file_b.display()
        );
        Ok(1)
    }
}
