//! CDN-hosted libraries.
//!
//! Names under the configured prefix map to versioned remote paths. Nothing
//! is downloaded: descriptors stay remote-only and are linked individually.

use crate::asset::FileDescriptor;
use crate::config::CdnConfig;

use super::{CompileOutcome, LibraryPlugin, partition_owned};

/// Key in [`FileDescriptor::extra`] holding the path below `base_url`.
pub(super) const REMOTE_PATH: &str = "path";

pub struct CdnLibrary {
    id: String,
    config: CdnConfig,
}

impl CdnLibrary {
    pub fn new(id: impl Into<String>, config: CdnConfig) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }

    fn version_of(&self, name: &str) -> Option<&str> {
        let package = self.config.packages.get(name)?;
        Some(package.version.as_deref().unwrap_or(&self.config.version))
    }
}

/// `jquery.js` -> `jquery.min.js`; already minified paths are kept.
fn minified_path(path: &str) -> String {
    for ext in [".js", ".css"] {
        if let Some(stem) = path.strip_suffix(ext) {
            if stem.ends_with(".min") {
                return path.to_owned();
            }
            return format!("{stem}.min{ext}");
        }
    }
    path.to_owned()
}

/// Join a base URL and a relative remote path with exactly one slash.
pub(super) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl LibraryPlugin for CdnLibrary {
    fn id(&self) -> &str {
        &self.id
    }

    fn claims(&self, name: &str) -> bool {
        !self.config.prefix.is_empty() && name.starts_with(&self.config.prefix)
    }

    fn file_data(&self, name: &str) -> Option<FileDescriptor> {
        let package = self.config.packages.get(name)?;
        let version = self.version_of(name)?;
        Some(
            FileDescriptor::library(name, &self.id, version)
                .with_dependencies(package.requires.clone())
                .with_provides(package.provides.clone())
                .with_extra(REMOTE_PATH, &package.path),
        )
    }

    fn signature(&self, descriptor: &FileDescriptor) -> Option<String> {
        self.version_of(descriptor.name()).map(str::to_owned)
    }

    fn compile_file(&self, descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        let path = descriptor.extra.get(REMOTE_PATH)?;
        let mut compiled = descriptor
            .clone()
            .with_extra(REMOTE_PATH, minified_path(path));
        compiled.is_resource = false;
        Some(CompileOutcome::Compiled(compiled))
    }

    fn compile_file_service(&self, descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        // nothing runs locally, the minified file already exists remotely
        self.compile_file(descriptor)
    }

    fn cat_files(&self, entries: Vec<FileDescriptor>) -> (Vec<FileDescriptor>, Vec<FileDescriptor>) {
        partition_owned(&self.id, entries)
    }

    fn url(&self, descriptor: &FileDescriptor) -> Option<String> {
        let path = descriptor.extra.get(REMOTE_PATH)?;
        Some(join_url(&self.config.base_url, path))
    }
}
