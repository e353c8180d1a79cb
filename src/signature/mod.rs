//! Signature providers: short staleness tokens for physical files.
//!
//! Three interchangeable strategies:
//! - **mtime**: modification time + size, cheapest, trusts the filesystem clock
//! - **hash**: blake3 content digest, survives `touch` and checkouts
//! - **version**: one global token, bumped by hand on deploy

mod hash;
mod mtime;

pub use hash::{ContentHash, compute_file_hash};
pub use mtime::mtime_token;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Strategy selector as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    #[default]
    Mtime,
    Hash,
    Version,
}

/// Maps a physical file path to its current signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureProvider {
    Mtime,
    Hash,
    Version(String),
}

impl SignatureProvider {
    /// Build a provider from configuration.
    pub fn new(kind: SignatureKind, version: &str) -> Self {
        match kind {
            SignatureKind::Mtime => Self::Mtime,
            SignatureKind::Hash => Self::Hash,
            SignatureKind::Version => Self::Version(version.to_owned()),
        }
    }

    /// Signature of `path`, `None` if the file cannot be read.
    ///
    /// The version strategy still requires the file to exist so that a
    /// deleted source never validates a cached record.
    pub fn sign(&self, path: &Path) -> Option<String> {
        match self {
            Self::Mtime => mtime_token(path),
            Self::Hash => compute_file_hash(path).map(|hash| hash.to_string()),
            Self::Version(token) => path.is_file().then(|| token.clone()),
        }
    }
}
