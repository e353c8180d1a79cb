//! `build` and `url` commands.

use anyhow::{Context, Result};

use super::BuildArgs;
use crate::asset::{AssetKind, DEFAULT_QUEUE};
use crate::config::AssetsConfig;
use crate::log;
use crate::pipeline::Pipeline;
use crate::utils::path::clean_name;

/// Queue the names, run every enabled stage and print one tag per artifact.
pub fn run_build(mut config: AssetsConfig, args: &BuildArgs) -> Result<()> {
    if args.no_compile {
        config.build.compile.enable = false;
    }
    if args.no_concat {
        config.build.concatenate = false;
    }

    let kind = args
        .kind
        .or_else(|| args.names.iter().find_map(|n| AssetKind::from_name(n)))
        .unwrap_or(AssetKind::Css);
    let pipeline = Pipeline::new(kind, config)?;

    let queue = args.queue.as_deref().unwrap_or(DEFAULT_QUEUE);
    for name in &args.names {
        if !pipeline.add(name, Some(queue)) {
            log!("build"; "`{}` skipped: not a {} asset it can find", name, kind);
        }
    }

    let tags = pipeline.render(Some(queue), &args.properties());
    if tags.is_empty() {
        log!("build"; "nothing to emit");
    }
    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}

/// Print the URL `name` is served under, after compiling it if enabled.
pub fn print_url(config: AssetsConfig, name: &str, kind: Option<AssetKind>) -> Result<()> {
    let kind = kind
        .or_else(|| AssetKind::from_name(name))
        .unwrap_or(AssetKind::Css);
    let compile = config.build.compile.enable;
    let pipeline = Pipeline::new(kind, config)?;

    let descriptor = pipeline
        .discover(&clean_name(name))
        .with_context(|| format!("`{name}` not found"))?;
    let mut list = vec![descriptor];
    if compile {
        list = pipeline.compile(list);
    }
    for url in pipeline.urls(&list) {
        println!("{url}");
    }
    Ok(())
}
