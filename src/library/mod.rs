//! Library plugins: virtual asset sources that join the same graph as files.
//!
//! A plugin answers for names it knows about (a CDN package, a toolkit
//! module, a remote download) and may take over compile, concatenation and
//! URL generation for its own descriptors. Every capability has a neutral
//! default, so calling one speculatively on any plugin is always safe.
//!
//! | Plugin    | Claims names | Compile             | Concatenation        |
//! |-----------|--------------|---------------------|----------------------|
//! | `cdn`     | by prefix    | swap to `.min` path | kept as remote links |
//! | `toolkit` | by prefix    | mark compiled       | one combo URL        |
//! | `fetch`   | no           | default transform   | default merge        |

mod cdn;
mod fetch;
mod toolkit;

pub use cdn::CdnLibrary;
pub use fetch::{FetchLibrary, Fetcher, UreqFetcher};
pub use toolkit::ToolkitLibrary;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::asset::FileDescriptor;
use crate::config::{AssetsConfig, LibraryBinding};

/// Result of a compile delegated to a plugin (or the default transform).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// A new descriptor for the compiled artifact.
    Compiled(FileDescriptor),
    /// Compile failed; the source is served until the negative entry expires.
    Failed,
    /// Compile started in the background.
    Pending,
}

// =============================================================================
// LibraryPlugin Trait
// =============================================================================

/// Capability table of a library plugin.
pub trait LibraryPlugin: Send + Sync {
    /// Identifier stamped on the descriptors this plugin produces.
    fn id(&self) -> &str;

    /// Whether `name` lives in this plugin's namespace.
    ///
    /// Claimed names are answered by the plugin alone; the filesystem is
    /// never probed for them.
    fn claims(&self, _name: &str) -> bool {
        false
    }

    /// Materialize metadata for `name`.
    fn file_data(&self, _name: &str) -> Option<FileDescriptor> {
        None
    }

    /// Current signature of one of this plugin's descriptors.
    fn signature(&self, _descriptor: &FileDescriptor) -> Option<String> {
        None
    }

    /// Compile and wait. `None` means the plugin has no compile capability.
    fn compile_file(&self, _descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        None
    }

    /// Start a background compile. `None` means no compile capability.
    fn compile_file_service(&self, _descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        None
    }

    /// Pull this plugin's entries out of a list about to be concatenated.
    ///
    /// Returns `(handled, rest)`. Handled entries skip the default merge.
    fn cat_files(&self, entries: Vec<FileDescriptor>) -> (Vec<FileDescriptor>, Vec<FileDescriptor>) {
        (Vec::new(), entries)
    }

    /// URL of one of this plugin's descriptors.
    fn url(&self, _descriptor: &FileDescriptor) -> Option<String> {
        None
    }
}

/// Split `entries` into those owned by `id` and the rest, order preserved.
pub fn partition_owned(
    id: &str,
    entries: Vec<FileDescriptor>,
) -> (Vec<FileDescriptor>, Vec<FileDescriptor>) {
    entries
        .into_iter()
        .partition(|d| d.library.as_deref() == Some(id))
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered plugin registry, resolved once by identifier.
#[derive(Default, Clone)]
pub struct Libraries {
    plugins: Vec<Arc<dyn LibraryPlugin>>,
    by_id: FxHashMap<String, usize>,
}

impl std::fmt::Debug for Libraries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.id()))
            .finish()
    }
}

impl Libraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build plugins from `[[library]]` bindings, downloading with ureq.
    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::from_config_with_fetcher(config, Arc::new(UreqFetcher::default()))
    }

    /// Build plugins from `[[library]]` bindings with a custom fetcher.
    pub fn from_config_with_fetcher(config: &AssetsConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let mut libraries = Self::new();
        for binding in &config.libraries {
            let id = binding.id().to_owned();
            match binding {
                LibraryBinding::Cdn(c) => libraries.register(CdnLibrary::new(id, c.clone())),
                LibraryBinding::Toolkit(c) => {
                    libraries.register(ToolkitLibrary::new(id, c.clone()))
                }
                LibraryBinding::Fetch(c) => libraries.register(FetchLibrary::new(
                    id,
                    c.clone(),
                    config.paths.source.clone(),
                    config.signature_provider(),
                    Arc::clone(&fetcher),
                )),
            }
        }
        libraries
    }

    /// Append a plugin. A later plugin with an existing id replaces the
    /// earlier one in place, keeping its position.
    pub fn register(&mut self, plugin: impl LibraryPlugin + 'static) {
        let plugin: Arc<dyn LibraryPlugin> = Arc::new(plugin);
        let id = plugin.id().to_owned();
        match self.by_id.get(&id) {
            Some(&idx) => self.plugins[idx] = plugin,
            None => {
                self.by_id.insert(id, self.plugins.len());
                self.plugins.push(plugin);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn LibraryPlugin> {
        self.by_id.get(id).map(|&idx| self.plugins[idx].as_ref())
    }

    /// Plugin owning `descriptor`, if it is library-bound.
    pub fn owner(&self, descriptor: &FileDescriptor) -> Option<&dyn LibraryPlugin> {
        descriptor.library.as_deref().and_then(|id| self.get(id))
    }

    /// First plugin (in registration order) claiming `name`.
    pub fn claimant(&self, name: &str) -> Option<&dyn LibraryPlugin> {
        self.iter().find(|p| p.claims(name))
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn LibraryPlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
