//! `check` command: load the config and report what it sets up.

use std::path::Path;

use anyhow::{Result, bail};

use crate::config::{AssetsConfig, find_config_file};
use crate::log;

pub fn check_config(name: &Path) -> Result<()> {
    let Some(path) = find_config_file(name) else {
        bail!("config file `{}` not found", name.display());
    };

    // warnings are printed by load, errors come back all at once
    let config = AssetsConfig::load(&path)?;

    log!("check"; "{} is valid", path.display());
    log!("check"; "source {} -> {}", config.paths.source.display(), config.paths.source_url);
    log!("check"; "output {} -> {}", config.paths.output.display(), config.paths.output_url);
    for binding in &config.libraries {
        log!("check"; "library `{}`", binding.id());
    }
    Ok(())
}
