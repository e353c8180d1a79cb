//! Dependency resolver: discovery of single names and the ordered walk.
//!
//! Discovery order for a name:
//! 1. in-process memo (verbatim reuse)
//! 2. metadata cache, accepted only if the signature still matches
//! 3. fresh probe, written back to the cache
//!
//! A probe asks a claiming plugin directly; otherwise it looks under the
//! source directory first and then asks every plugin in order.

use rustc_hash::FxHashSet;

use crate::asset::{FileDescriptor, HeaderMarkers, scan_file};
use crate::cache::{CacheEntry, CacheKey};
use crate::debug;
use crate::utils::path::clean_name;

use super::Pipeline;

/// Work item of the resolver's explicit stack.
enum Frame {
    /// Discover a name and schedule its dependencies.
    Enter(String),
    /// All dependencies are out; emit the descriptor.
    Emit(String, FileDescriptor),
}

impl Pipeline {
    /// Dependency-first ordering of `names`.
    ///
    /// Skips names already emitted by this pipeline, names already in the
    /// result (directly or as an alias) and names that cannot be
    /// discovered. A dependency cycle is cut where it closes.
    pub fn resolve(&self, names: &[String]) -> Vec<FileDescriptor> {
        let mut output = self.output.lock();
        let mut result = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut in_progress: FxHashSet<String> = FxHashSet::default();

        for root in names {
            let mut stack = vec![Frame::Enter(clean_name(root))];
            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter(name) => {
                        if output.contains(&name) || seen.contains(&name) || in_progress.contains(&name) {
                            continue;
                        }
                        let Some(descriptor) = self.discover(&name) else {
                            debug!("resolve"; "skipping unresolvable `{}`", name);
                            continue;
                        };

                        in_progress.insert(name.clone());
                        let deps: Vec<String> =
                            descriptor.dependencies.iter().map(|d| clean_name(d)).collect();
                        stack.push(Frame::Emit(name, descriptor));
                        stack.extend(deps.into_iter().rev().map(Frame::Enter));
                    }
                    Frame::Emit(name, descriptor) => {
                        in_progress.remove(&name);
                        seen.insert(name);
                        for alias in descriptor.names() {
                            seen.insert(alias.to_owned());
                        }
                        output.record(&descriptor);
                        result.push(descriptor);
                    }
                }
            }
        }
        result
    }

    /// Metadata for one name, `None` if nothing knows about it.
    pub fn discover(&self, name: &str) -> Option<FileDescriptor> {
        if let Some(known) = self.known.lock().get(name) {
            return Some(known.clone());
        }

        let key = CacheKey::file(name);
        let descriptor = match self.cache.get(&key) {
            Some(CacheEntry::File(cached)) if self.is_current(&cached) => cached,
            _ => {
                let fresh = self.probe(name)?;
                self.cache.set(&key, CacheEntry::File(fresh.clone()), None);
                fresh
            }
        };

        self.known
            .lock()
            .insert(name.to_owned(), descriptor.clone());
        Some(descriptor)
    }

    /// Whether a cached descriptor's signature still matches its source.
    fn is_current(&self, descriptor: &FileDescriptor) -> bool {
        let current = match self.libraries.owner(descriptor) {
            Some(plugin) => plugin.signature(descriptor),
            None if descriptor.is_plain() => {
                descriptor.path().and_then(|p| self.signatures.sign(p))
            }
            // bound to a plugin that is no longer registered
            None => None,
        };
        current.as_deref() == Some(descriptor.signature.as_str())
    }

    fn probe(&self, name: &str) -> Option<FileDescriptor> {
        if let Some(plugin) = self.libraries.claimant(name) {
            return plugin.file_data(name).map(|d| self.localize(d));
        }
        if let Some(file) = self.probe_file(name) {
            return Some(file);
        }
        self.libraries
            .iter()
            .find_map(|plugin| plugin.file_data(name))
            .map(|d| self.localize(d))
    }

    /// Plain file under the source directory.
    fn probe_file(&self, name: &str) -> Option<FileDescriptor> {
        let path = self.config.paths.source.join(name);
        if !path.is_file() {
            return None;
        }
        let signature = self.signatures.sign(&path)?;
        let markers = self.scan(name, &path);
        Some(
            FileDescriptor::resource(name, path, signature)
                .with_dependencies(markers.requires)
                .with_provides(markers.provides),
        )
    }

    /// Normalize a plugin result; a localized file gets its header scanned
    /// like any other plain file.
    fn localize(&self, descriptor: FileDescriptor) -> FileDescriptor {
        let descriptor = descriptor.localized();
        if !descriptor.is_plain() || !descriptor.dependencies.is_empty() {
            return descriptor;
        }
        let Some(path) = descriptor.path().map(|p| p.to_path_buf()) else {
            return descriptor;
        };

        let markers = self.scan(descriptor.name(), &path);
        let mut provides = descriptor.provides.clone();
        for alias in markers.provides {
            if !provides.contains(&alias) {
                provides.push(alias);
            }
        }
        descriptor
            .with_dependencies(markers.requires)
            .with_provides(provides)
    }

    fn scan(&self, name: &str, path: &std::path::Path) -> HeaderMarkers {
        scan_file(name, path).unwrap_or_else(|e| {
            debug!("resolve"; "cannot scan `{}`: {}", name, e);
            HeaderMarkers::default()
        })
    }
}
