//! Compile stage: one transform per descriptor, results cached by target.
//!
//! Per descriptor:
//! 1. generated descriptors pass through
//! 2. cache lookup by target name (`Pending` means "serve the source")
//! 3. owning plugin with a compile capability takes over
//! 4. target already on disk: rewrite as compiled, no transform
//! 5. default transform (sync: wait and publish; service: spawn)
//!
//! Failures and background work leave a negative entry behind so the
//! transform is not retried before `negative_ttl` runs out.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use crate::asset::FileDescriptor;
use crate::cache::{CacheEntry, CacheKey};
use crate::compile::TransformRequest;
use crate::config::CompileMode;
use crate::library::CompileOutcome;
use crate::utils::path::{ensure_dir, publish_staged};
use crate::{debug, log};

use super::Pipeline;
use super::target::{Target, compile_digest};

impl Pipeline {
    /// Compile every descriptor independently (in parallel), order preserved.
    pub fn compile(&self, list: Vec<FileDescriptor>) -> Vec<FileDescriptor> {
        list.into_par_iter()
            .map(|descriptor| self.compile_one(descriptor))
            .collect()
    }

    fn compile_one(&self, descriptor: FileDescriptor) -> FileDescriptor {
        if !descriptor.is_resource {
            return descriptor;
        }

        let target = self.target(&compile_digest(&descriptor));
        let key = CacheKey::compile(&target.name);
        match self.cache.get(&key) {
            Some(CacheEntry::Pending) => {
                debug!("compile"; "{} pending, serving source", descriptor.name());
                return descriptor;
            }
            Some(CacheEntry::File(cached)) if cached.path().is_none_or(Path::is_file) => {
                return cached;
            }
            _ => {}
        }

        if let Some(plugin) = self.libraries.owner(&descriptor) {
            let outcome = match self.config.build.compile.mode {
                CompileMode::Sync => plugin.compile_file(&descriptor),
                CompileMode::Service => plugin.compile_file_service(&descriptor),
            };
            if let Some(outcome) = outcome {
                return self.settle(descriptor, &key, outcome);
            }
        }

        let Some(source) = descriptor.path().map(Path::to_path_buf) else {
            // remote-only and nobody to compile it
            return descriptor;
        };

        if target.path.is_file() {
            debug!("compile"; "{} already at {}", descriptor.name(), target.name);
            let outcome = CompileOutcome::Compiled(descriptor.compiled(&target.name, &target.path));
            return self.settle(descriptor, &key, outcome);
        }

        let outcome = match self.config.build.compile.mode {
            CompileMode::Sync => match self.transform_sync(&source, &target) {
                Ok(()) => {
                    log!("compile"; "{} -> {}", descriptor.name(), target.name);
                    CompileOutcome::Compiled(descriptor.compiled(&target.name, &target.path))
                }
                Err(e) => {
                    log!("compile"; "{} failed, serving source: {:#}", descriptor.name(), e);
                    CompileOutcome::Failed
                }
            },
            CompileMode::Service => match self.transform_service(&source, &target) {
                Ok(()) => {
                    debug!("compile"; "{} -> {} started in background", descriptor.name(), target.name);
                    CompileOutcome::Pending
                }
                Err(e) => {
                    log!("compile"; "{} could not start: {:#}", descriptor.name(), e);
                    CompileOutcome::Failed
                }
            },
        };
        self.settle(descriptor, &key, outcome)
    }

    /// Record an outcome in the cache and pick the descriptor to continue with.
    fn settle(
        &self,
        original: FileDescriptor,
        key: &CacheKey,
        outcome: CompileOutcome,
    ) -> FileDescriptor {
        match outcome {
            CompileOutcome::Compiled(compiled) => {
                self.cache
                    .set(key, CacheEntry::File(compiled.clone()), None);
                compiled
            }
            CompileOutcome::Failed | CompileOutcome::Pending => {
                self.cache.set(
                    key,
                    CacheEntry::Pending,
                    Some(self.config.build.negative_ttl()),
                );
                original
            }
        }
    }

    /// Transform into a staging file next to the target, then rename it in.
    fn transform_sync(&self, source: &Path, target: &Target) -> Result<()> {
        let dir = target
            .path
            .parent()
            .context("target has no parent directory")?;
        ensure_dir(dir, self.config.build.dir_mode)
            .with_context(|| format!("create {}", dir.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(".tola-")
            .suffix(&format!(".{}", self.kind.ext()))
            .tempfile_in(dir)
            .with_context(|| format!("create staging file in {}", dir.display()))?
            .into_temp_path();

        let request = TransformRequest {
            kind: self.kind,
            source: source.to_path_buf(),
            destination: staging.to_path_buf(),
            background: None,
            file_mode: self.config.build.file_mode,
        };
        let report = self.transformer.transform(&request)?;
        if !report.success {
            bail!("transform reported failure: {}", report.stdout);
        }
        if !report.stdout.is_empty() {
            debug!("compile"; "{}", report.stdout);
        }

        let produced = fs::metadata(&staging).map(|m| m.len()).unwrap_or(0);
        let original = fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        if produced == 0 && original > 0 {
            bail!("transform produced no output");
        }

        let staging = staging.keep().context("keep staging file")?;
        publish_staged(&staging, &target.path, self.config.build.file_mode).inspect_err(|_| {
            let _ = fs::remove_file(&staging);
        })
    }

    /// Hand the file to the transform without waiting for it.
    fn transform_service(&self, source: &Path, target: &Target) -> Result<()> {
        let dir = target
            .path
            .parent()
            .context("target has no parent directory")?;
        ensure_dir(dir, self.config.build.dir_mode)
            .with_context(|| format!("create {}", dir.display()))?;

        let file_name = target
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let background = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

        self.transformer.spawn(TransformRequest {
            kind: self.kind,
            source: source.to_path_buf(),
            destination: target.path.clone(),
            background: Some(background),
            file_mode: self.config.build.file_mode,
        })
    }

    pub(super) fn target(&self, digest: &str) -> Target {
        Target::new(
            digest,
            self.kind.ext(),
            self.config.build.shard,
            &self.config.paths.output,
        )
    }
}
