//! Built-in minification transform.

use std::fs;

use anyhow::{Context, Result};

use crate::asset::minify::minify;
use crate::debug;
use crate::utils::path::{publish, publish_staged};

use super::{TransformReport, TransformRequest, Transformer};

/// Minifies in-process: oxc for scripts, lightningcss for stylesheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTransformer;

impl BuiltinTransformer {
    /// `None` when the source does not parse or a non-empty source
    /// minifies to nothing.
    fn minified(request: &TransformRequest) -> Result<Option<String>> {
        let source = fs::read_to_string(&request.source)
            .with_context(|| format!("read {}", request.source.display()))?;
        Ok(minify(request.kind, &source).filter(|code| !code.is_empty() || source.is_empty()))
    }

    /// Background job body: minify, then publish onto the destination.
    fn run_detached(request: &TransformRequest) -> Result<()> {
        let Some(code) = Self::minified(request)? else {
            anyhow::bail!("{} could not be minified", request.source.display());
        };
        match &request.background {
            Some(scratch) => {
                fs::write(scratch, &code)
                    .with_context(|| format!("write {}", scratch.display()))?;
                publish_staged(scratch, &request.destination, request.file_mode)
            }
            None => publish(&request.destination, None, request.file_mode, |f| {
                std::io::Write::write_all(f, code.as_bytes())
            }),
        }
    }
}

impl Transformer for BuiltinTransformer {
    fn transform(&self, request: &TransformRequest) -> Result<TransformReport> {
        let Some(code) = Self::minified(request)? else {
            return Ok(TransformReport::failed(format!(
                "{} could not be minified as {}",
                request.source.display(),
                request.kind
            )));
        };
        fs::write(&request.destination, code)
            .with_context(|| format!("write {}", request.destination.display()))?;
        Ok(TransformReport::ok())
    }

    fn spawn(&self, request: TransformRequest) -> Result<()> {
        std::thread::Builder::new()
            .name("tola-assets-compile".into())
            .spawn(move || {
                if let Err(e) = Self::run_detached(&request) {
                    debug!("compile"; "background minify failed: {:#}", e);
                }
            })
            .context("spawn background compile")?;
        Ok(())
    }
}
