//! Content-addressed artifact locations.
//!
//! A target name is a digest plus the kind's extension, optionally under a
//! shard directory made of the digest's first characters:
//!
//! ```text
//! shard = 0   3f1c9a0e77d2e4a1.css
//! shard = 2   3f/3f1c9a0e77d2e4a1.css
//! ```

use std::path::{Path, PathBuf};

use crate::asset::FileDescriptor;
use crate::utils::hash;

/// Where a generated artifact lives, by name (relative to the output
/// directory and URL) and by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Target {
    pub name: String,
    pub path: PathBuf,
}

impl Target {
    pub fn new(digest: &str, ext: &str, shard: usize, output: &Path) -> Self {
        let file = format!("{digest}.{ext}");
        let name = match shard.min(digest.len()) {
            0 => file,
            n => format!("{}/{file}", &digest[..n]),
        };
        let path = output.join(&name);
        Self { name, path }
    }
}

/// Digest for a compiled copy of one descriptor. Independent of any
/// neighbour: only the name and its signature go in.
pub(super) fn compile_digest(descriptor: &FileDescriptor) -> String {
    hash::digest([descriptor.name(), descriptor.signature.as_str()])
}

/// Digest for a merged artifact; order-sensitive, so reordering the
/// inputs yields a different file.
pub(super) fn concat_digest(entries: &[FileDescriptor]) -> String {
    hash::digest(
        entries
            .iter()
            .flat_map(|d| [d.name(), d.signature.as_str()]),
    )
}
