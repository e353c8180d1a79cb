//! Remote packages fetched into the source tree.
//!
//! The first reference to a configured name downloads it to
//! `<source>/<name>`; from then on it is an ordinary file and the filesystem
//! probe finds it before this plugin is ever asked again.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::asset::FileDescriptor;
use crate::config::FetchConfig;
use crate::signature::SignatureProvider;
use crate::utils::path::{clean_name, publish};
use crate::{debug, log};

use super::LibraryPlugin;

/// Downloads raw bytes from a URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher backed by ureq.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl Default for UreqFetcher {
    fn default() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .into();
        Self { agent }
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("GET {url}"))?;
        response
            .body_mut()
            .read_to_vec()
            .with_context(|| format!("read body of {url}"))
    }
}

pub struct FetchLibrary {
    id: String,
    config: FetchConfig,
    source_dir: PathBuf,
    signatures: SignatureProvider,
    fetcher: Arc<dyn Fetcher>,
}

impl FetchLibrary {
    pub fn new(
        id: impl Into<String>,
        config: FetchConfig,
        source_dir: PathBuf,
        signatures: SignatureProvider,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            id: id.into(),
            config,
            source_dir,
            signatures,
            fetcher,
        }
    }

    fn download(&self, url: &str, target: &std::path::Path) -> Result<()> {
        let bytes = self.fetcher.fetch(url)?;
        publish(target, None, None, |f| f.write_all(&bytes))
    }
}

impl LibraryPlugin for FetchLibrary {
    fn id(&self) -> &str {
        &self.id
    }

    fn file_data(&self, name: &str) -> Option<FileDescriptor> {
        let url = self.config.packages.get(name)?;
        let target = self.source_dir.join(clean_name(name));

        if target.is_file() {
            debug!("fetch"; "{} already present", name);
        } else {
            if let Err(e) = self.download(url, &target) {
                log!("fetch"; "failed to fetch `{}` from {}: {:#}", name, url, e);
                return None;
            }
            log!("fetch"; "{} <- {}", name, url);
        }

        let signature = self.signatures.sign(&target)?;
        let mut descriptor = FileDescriptor::library(name, &self.id, signature);
        descriptor.file_path = Some(target);
        Some(descriptor)
    }

    fn signature(&self, descriptor: &FileDescriptor) -> Option<String> {
        descriptor.path().and_then(|p| self.signatures.sign(p))
    }
}
