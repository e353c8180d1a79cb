//! Command-line interface module.

mod args;
pub mod build;
pub mod check;
pub mod clean;

pub use args::{BuildArgs, Cli, Commands};

use std::path::Path;

use anyhow::Result;

use crate::config::{AssetsConfig, find_config_file};
use crate::debug;

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Build { args } => build::run_build(load_config(&cli.config)?, args),
        Commands::Url { name, kind } => build::print_url(load_config(&cli.config)?, name, *kind),
        Commands::Check => check::check_config(&cli.config),
        Commands::Clean => clean::clean(&load_config(&cli.config)?),
    }
}

/// Load the nearest config file, or defaults rooted at the current
/// directory when there is none.
fn load_config(name: &Path) -> Result<AssetsConfig> {
    if let Some(path) = find_config_file(name) {
        debug!("config"; "using {}", path.display());
        return AssetsConfig::load(&path);
    }

    debug!("config"; "no {} found, using defaults", name.display());
    let mut config = AssetsConfig::default();
    config.finalize(&std::env::current_dir()?);
    config.validate()?;
    Ok(config)
}
