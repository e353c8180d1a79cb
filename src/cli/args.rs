//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::asset::AssetKind;

/// Stylesheet and script pipeline for tola sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assets.toml)
    #[arg(short = 'C', long, global = true, default_value = "assets.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the pipeline for some assets and print the markup
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Print the URL a single asset resolves to
    #[command(visible_alias = "u")]
    Url {
        /// Asset name, relative to the source directory
        name: String,

        /// Asset kind (default: from the name's extension)
        #[arg(short, long)]
        kind: Option<AssetKind>,
    },

    /// Validate the configuration
    #[command(visible_alias = "c")]
    Check,

    /// Remove generated artifacts and the metadata cache
    Clean,
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Asset names, relative to the source directory
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Asset kind (default: from the first name's extension)
    #[arg(short, long)]
    pub kind: Option<AssetKind>,

    /// Queue to collect the names in; also the base of the tag ids
    #[arg(short, long)]
    pub queue: Option<String>,

    /// Extra tag attribute as `key=value` (or a bare `key`)
    #[arg(short, long = "attr", value_name = "KEY=VALUE")]
    pub attrs: Vec<String>,

    /// Serve sources without compiling them
    #[arg(long)]
    pub no_compile: bool,

    /// Keep every file as its own artifact
    #[arg(long)]
    pub no_concat: bool,
}

impl BuildArgs {
    /// Attributes as `(key, value)` pairs; a bare key has an empty value.
    pub fn properties(&self) -> Vec<(&str, &str)> {
        self.attrs
            .iter()
            .map(|attr| attr.split_once('=').unwrap_or((attr.as_str(), "")))
            .collect()
    }
}
