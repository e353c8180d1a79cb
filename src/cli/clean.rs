//! `clean` command: drop generated artifacts and cached metadata.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jwalk::WalkDir;

use crate::config::AssetsConfig;
use crate::log;

pub fn clean(config: &AssetsConfig) -> Result<()> {
    let mut removed = 0;
    for dir in [&config.paths.output, &config.paths.cache] {
        removed += remove_tree(dir)?;
    }
    log!("clean"; "removed {} files", removed);
    Ok(())
}

/// Remove `dir`, returning how many files it held.
fn remove_tree(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let count = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
    Ok(count)
}
