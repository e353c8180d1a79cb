//! Asset pipeline: resolve → compile → concatenate → URL → markup.
//!
//! One [`Pipeline`] serves one asset kind. It owns the queues and the
//! OutputList for its lifetime, so several `generate` calls on the same page
//! never emit an asset twice.
//!
//! ```text
//! add("css/site.css") ─┐
//! add("lib/grid.css") ─┴─► queue ─► resolve ─► compile ─► concatenate ─► url_for ─► emit
//!                                    │            │            │
//!                                    ▼            ▼            ▼
//!                               file cache   compile cache  concat cache
//! ```
//!
//! Collaborators (metadata cache, plugins, transformer, URL override) are
//! injected through [`Pipeline::builder`]; nothing here is process-global.

mod compile;
mod concat;
mod markup;
mod resolve;
mod target;
mod url;

#[cfg(test)]
mod tests;

pub use markup::emit;

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::asset::{AssetKind, DEFAULT_QUEUE, FileDescriptor, OutputList, Queues};
use crate::cache::{DiskCache, MetadataCache};
use crate::compile::{self as transform, Transformer};
use crate::config::{AssetsConfig, ConfigError};
use crate::debug;
use crate::library::Libraries;
use crate::signature::SignatureProvider;
use crate::utils::path::clean_name;

/// Caller-supplied URL rule, consulted after plugins and before convention.
pub type UrlOverride = Arc<dyn Fn(&FileDescriptor) -> Option<String> + Send + Sync>;

// ============================================================================
// Pipeline
// ============================================================================

pub struct Pipeline {
    kind: AssetKind,
    config: AssetsConfig,
    signatures: SignatureProvider,
    cache: Arc<dyn MetadataCache>,
    libraries: Libraries,
    transformer: Arc<dyn Transformer>,
    url_override: Option<UrlOverride>,
    queues: Mutex<Queues>,
    output: Mutex<OutputList>,
    /// Names discovered in this process, reused verbatim.
    known: Mutex<FxHashMap<String, FileDescriptor>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("kind", &self.kind)
            .field("libraries", &self.libraries)
            .field("emitted", &self.output.lock().len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with collaborators derived from `config`.
    pub fn new(kind: AssetKind, config: AssetsConfig) -> Result<Self> {
        Self::builder(kind, config).build()
    }

    pub fn builder(kind: AssetKind, config: AssetsConfig) -> PipelineBuilder {
        PipelineBuilder {
            kind,
            config,
            cache: None,
            libraries: None,
            transformer: None,
            url_override: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    #[inline]
    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    /// Queue `name` if it can be discovered. Unresolvable names (and names
    /// of the other asset kind) are dropped and `false` is returned.
    pub fn add(&self, name: &str, queue: Option<&str>) -> bool {
        let name = clean_name(name);
        if AssetKind::from_name(&name).is_some_and(|k| k != self.kind) {
            debug!("resolve"; "`{}` is not a {} asset, dropped", name, self.kind);
            return false;
        }
        if self.discover(&name).is_none() {
            debug!("resolve"; "`{}` not found, dropped", name);
            return false;
        }
        self.queues
            .lock()
            .push(queue.unwrap_or(DEFAULT_QUEUE), name);
        true
    }

    /// Names emitted so far (including aliases).
    pub fn emitted(&self) -> OutputList {
        self.output.lock().clone()
    }

    /// Consume `queue` and run every enabled stage, returning one URL per
    /// artifact in emission order.
    pub fn generate(&self, queue: Option<&str>) -> Vec<String> {
        let names = self.queues.lock().take(queue.unwrap_or(DEFAULT_QUEUE));
        if names.is_empty() {
            return Vec::new();
        }

        let mut list = self.resolve(&names);
        if self.config.build.compile.enable {
            list = self.compile(list);
        }
        if self.config.build.concatenate {
            list = self.concatenate(list);
        }
        self.urls(&list)
    }

    /// [`Pipeline::generate`] followed by markup emission.
    pub fn render(&self, queue: Option<&str>, properties: &[(&str, &str)]) -> Vec<String> {
        let queue = queue.unwrap_or(DEFAULT_QUEUE);
        let urls = self.generate(Some(queue));
        emit(self.kind, &urls, properties, queue)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Injects collaborators; anything left unset is derived from the config.
pub struct PipelineBuilder {
    kind: AssetKind,
    config: AssetsConfig,
    cache: Option<Arc<dyn MetadataCache>>,
    libraries: Option<Libraries>,
    transformer: Option<Arc<dyn Transformer>>,
    url_override: Option<UrlOverride>,
}

impl PipelineBuilder {
    /// Metadata cache (default: [`DiskCache`] at `paths.cache`).
    pub fn cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Plugin registry (default: built from `[[library]]`).
    pub fn libraries(mut self, libraries: Libraries) -> Self {
        self.libraries = Some(libraries);
        self
    }

    /// Default transform (default: from `[build.compile]`).
    pub fn transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn url_override<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FileDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        self.url_override = Some(Arc::new(rule));
        self
    }

    /// Validate the configuration and assemble the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        let diag = self.config.diagnostics();
        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)?;

        let config = self.config;
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(DiskCache::new(&config.paths.cache)));
        let libraries = self
            .libraries
            .unwrap_or_else(|| Libraries::from_config(&config));
        let transformer = self
            .transformer
            .unwrap_or_else(|| transform::from_config(&config));

        Ok(Pipeline {
            kind: self.kind,
            signatures: config.signature_provider(),
            config,
            cache,
            libraries,
            transformer,
            url_override: self.url_override,
            queues: Mutex::new(Queues::new()),
            output: Mutex::new(OutputList::new()),
            known: Mutex::new(FxHashMap::default()),
        })
    }
}
