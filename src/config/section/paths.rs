//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! source = "assets"             # where source assets live
//! source_url = "/assets"        # URL prefix serving `source`
//! output = "public/_assets"     # where generated artifacts are published
//! output_url = "/_assets"       # URL prefix serving `output`
//! cache = ".tola/assets"        # metadata cache directory
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::CACHE_DIR;
use crate::config::util::{expand_path, is_url_prefix};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source: PathBuf,
    pub source_url: String,
    pub output: PathBuf,
    pub output_url: String,
    pub cache: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: "assets".into(),
            source_url: "/assets".into(),
            output: "public/_assets".into(),
            output_url: "/_assets".into(),
            cache: CACHE_DIR.into(),
        }
    }
}

impl PathsConfig {
    pub const SOURCE: FieldPath = FieldPath::new("paths.source");
    pub const SOURCE_URL: FieldPath = FieldPath::new("paths.source_url");
    pub const OUTPUT: FieldPath = FieldPath::new("paths.output");
    pub const OUTPUT_URL: FieldPath = FieldPath::new("paths.output_url");
    pub const CACHE: FieldPath = FieldPath::new("paths.cache");

    /// Resolve every directory against `root` (with `~` expansion).
    pub fn normalize(&mut self, root: &Path) {
        self.source = expand_path(&self.source, root);
        self.output = expand_path(&self.output, root);
        self.cache = expand_path(&self.cache, root);
    }

    /// `root` is the project root; `clean` deletes `output` and `cache`
    /// wholesale, so neither may hold it or the sources.
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if !self.source.is_dir() {
            diag.error(
                Self::SOURCE,
                format!("source directory `{}` does not exist", self.source.display()),
            );
        }
        for (field, value) in [
            (Self::SOURCE_URL, &self.source_url),
            (Self::OUTPUT_URL, &self.output_url),
        ] {
            if !is_url_prefix(value) {
                diag.error_with_hint(
                    field,
                    format!("`{value}` is not a URL prefix"),
                    "use an absolute path like `/assets` or a full URL",
                );
            }
        }

        let protected = [lexical(&self.source), lexical(root)];
        for (field, dir) in [(Self::OUTPUT, &self.output), (Self::CACHE, &self.cache)] {
            let dir = lexical(dir);
            if let Some(inner) = protected.iter().find(|p| p.starts_with(&dir)) {
                diag.error_with_hint(
                    field,
                    format!("`{}` contains `{}`", dir.display(), inner.display()),
                    "use a dedicated directory such as `public/_assets`",
                );
            }
        }
    }
}

/// Drop `.` and fold `..` without touching the filesystem.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
