//! File descriptor: metadata describing one logical asset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AssetKind;

/// Key in [`FileDescriptor::extra`] recording the pre-compile name.
const SOURCE_NAME: &str = "source";

/// Metadata for one asset as it moves through the pipeline.
///
/// Stages never mutate a descriptor they were handed; they derive a new one
/// (see [`FileDescriptor::compiled`]) so cached copies held elsewhere stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Unique key within a build session.
    name: String,
    /// Original, unmodified source file (false once compiled or merged).
    pub is_resource: bool,
    /// Owning library plugin, `None` for plain filesystem files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Names that must be emitted before this one, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Staleness token computed at discovery time.
    pub signature: String,
    /// Physical file, absent for remote-only entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Pre-bound URL, short-circuits URL generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Other logical names this descriptor supersedes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    /// Plugin-specific pass-through data (copyright, remote path, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl FileDescriptor {
    /// Descriptor for a source file on disk.
    pub fn resource(name: impl Into<String>, path: impl Into<PathBuf>, signature: impl Into<String>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::bare(name.into(), signature.into())
        }
    }

    /// Descriptor owned by a library plugin.
    pub fn library(name: impl Into<String>, library: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            library: Some(library.into()),
            ..Self::bare(name.into(), signature.into())
        }
    }

    /// Descriptor for a generated artifact (compiled or merged file).
    pub fn generated(name: impl Into<String>, path: impl Into<PathBuf>, signature: impl Into<String>) -> Self {
        Self {
            is_resource: false,
            file_path: Some(path.into()),
            ..Self::bare(name.into(), signature.into())
        }
    }

    fn bare(name: String, signature: String) -> Self {
        Self {
            name,
            is_resource: true,
            library: None,
            dependencies: Vec::new(),
            signature,
            file_path: None,
            url: None,
            provides: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }

    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        self.provides = provides;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_name(&self.name)
    }

    /// Whether this descriptor is handled by the generic filesystem code paths.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.library.is_none()
    }

    /// Drop the library binding once a plugin has localized the asset to disk.
    ///
    /// A descriptor carrying both a library and a physical file but no
    /// pre-bound URL is a plain file from here on.
    pub fn localized(mut self) -> Self {
        if self.library.is_some() && self.file_path.is_some() && self.url.is_none() {
            self.library = None;
        }
        self
    }

    /// New descriptor pointing at a compiled artifact of this one.
    ///
    /// Signature, dependencies and aliases carry over; the result is a
    /// generated plain file.
    pub fn compiled(&self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let mut extra = self.extra.clone();
        extra
            .entry(SOURCE_NAME.to_owned())
            .or_insert_with(|| self.name.clone());
        Self {
            name: name.into(),
            is_resource: false,
            library: None,
            file_path: Some(path.into()),
            url: None,
            extra,
            ..self.clone()
        }
    }

    /// Human-readable name: the source a compiled artifact came from, or
    /// the descriptor's own name.
    pub fn source_name(&self) -> &str {
        self.extra
            .get(SOURCE_NAME)
            .map_or(self.name.as_str(), String::as_str)
    }

    /// Every name this descriptor answers to: its own plus `provides`.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.provides.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_defaults() {
        let d = FileDescriptor::resource("a.css", "/src/a.css", "abc");
        assert!(d.is_resource);
        assert!(d.is_plain());
        assert_eq!(d.kind(), Some(AssetKind::Css));
        assert_eq!(d.path(), Some(Path::new("/src/a.css")));
    }

    #[test]
    fn test_localized_clears_library() {
        let d = FileDescriptor::library("vendor/x.js", "fetch", "1").localized();
        assert_eq!(d.library.as_deref(), Some("fetch"));

        let mut d = FileDescriptor::library("vendor/x.js", "fetch", "1");
        d.file_path = Some(PathBuf::from("/src/vendor/x.js"));
        assert!(d.clone().localized().is_plain());

        // a pre-bound URL keeps the plugin in charge
        let d = d.with_url("https://cdn/x.js").localized();
        assert!(!d.is_plain());
    }

    #[test]
    fn test_compiled_keeps_signature_and_original_untouched() {
        let original = FileDescriptor::resource("a.js", "/src/a.js", "sig")
            .with_dependencies(vec!["b.js".into()]);
        let compiled = original.compiled("0123.js", "/out/0123.js");

        assert_eq!(compiled.name(), "0123.js");
        assert!(!compiled.is_resource);
        assert_eq!(compiled.signature, "sig");
        assert_eq!(compiled.dependencies, vec!["b.js".to_string()]);
        assert!(original.is_resource);
        assert_eq!(original.name(), "a.js");
        assert_eq!(compiled.source_name(), "a.js");
        assert_eq!(original.source_name(), "a.js");
    }

    #[test]
    fn test_names_includes_provides() {
        let d = FileDescriptor::library("lib/jquery.js", "cdn", "3")
            .with_provides(vec!["lib/$.js".into()]);
        let names: Vec<_> = d.names().collect();
        assert_eq!(names, vec!["lib/jquery.js", "lib/$.js"]);
    }

    #[test]
    fn test_serde_skips_empty_fields() {
        let d = FileDescriptor::resource("a.css", "/a.css", "s");
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("library"));
        assert!(!json.contains("dependencies"));
        let back: FileDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
