//! Concatenation stage: merge the remaining plain files into one artifact.
//!
//! Plugins pull their own entries out first (in registration order). What
//! is left is merged in order, provided every entry has a file on disk.
//! A merge that cannot be written degrades to the unmerged list.

use std::fs::File;
use std::io::{self, Write};

use anyhow::Result;

use crate::asset::FileDescriptor;
use crate::cache::{CacheEntry, CacheKey};
use crate::utils::path::publish;
use crate::{debug, log};

use super::Pipeline;
use super::target::{Target, concat_digest};

impl Pipeline {
    /// Merge `list` into as few artifacts as the plugins allow.
    ///
    /// Output order: entries handled by plugins, then the merged file.
    pub fn concatenate(&self, list: Vec<FileDescriptor>) -> Vec<FileDescriptor> {
        if !self.config.build.concatenate || list.len() <= 1 {
            return list;
        }

        let mut handled = Vec::new();
        let mut rest = list;
        for plugin in self.libraries.iter() {
            let (taken, remaining) = plugin.cat_files(rest);
            handled.extend(taken);
            rest = remaining;
        }

        if rest.len() <= 1 || rest.iter().any(|d| d.path().is_none()) {
            handled.extend(rest);
            return handled;
        }

        match self.merge(&rest) {
            Some(merged) => handled.push(merged),
            None => handled.extend(rest),
        }
        handled
    }

    fn merge(&self, entries: &[FileDescriptor]) -> Option<FileDescriptor> {
        let key = CacheKey::concat(
            entries
                .iter()
                .map(|d| (d.name(), d.signature.as_str())),
        );
        // the key ignores order, the bytes do not: only the artifact for
        // this exact order is reusable
        let target = self.target(&concat_digest(entries));
        if let Some(CacheEntry::File(cached)) = self.cache.get(&key)
            && cached.name() == target.name
            && cached.path().is_some_and(|p| p.is_file())
        {
            return Some(cached);
        }

        if target.path.is_file() {
            debug!("concat"; "reusing {}", target.name);
        } else if let Err(e) = self.write_merged(entries, &target) {
            log!("concat"; "{} not written, serving files separately: {:#}", target.name, e);
            return None;
        } else {
            log!("concat"; "{} files -> {}", entries.len(), target.name);
        }

        let signature = self.signatures.sign(&target.path)?;
        let merged = FileDescriptor::generated(&target.name, &target.path, signature);
        self.cache.set(&key, CacheEntry::File(merged.clone()), None);
        Some(merged)
    }

    fn write_merged(&self, entries: &[FileDescriptor], target: &Target) -> Result<()> {
        let build = &self.config.build;
        publish(&target.path, build.dir_mode, build.file_mode, |out| {
            for descriptor in entries {
                if build.separator {
                    out.write_all(self.kind.separator(descriptor.source_name()).as_bytes())?;
                }
                let path = descriptor
                    .path()
                    .ok_or_else(|| io::Error::other(format!("`{}` has no file", descriptor.name())))?;
                io::copy(&mut File::open(path)?, out)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        })
    }
}
