//! URL generation.
//!
//! First answer wins:
//! 1. URL bound on the descriptor
//! 2. owning plugin
//! 3. caller override
//! 4. convention: `source_url/name` for sources, `output_url/name` for
//!    generated artifacts

use crate::asset::FileDescriptor;

use super::Pipeline;

impl Pipeline {
    pub fn url_for(&self, descriptor: &FileDescriptor) -> String {
        if let Some(url) = &descriptor.url {
            return url.clone();
        }
        if let Some(url) = self
            .libraries
            .owner(descriptor)
            .and_then(|plugin| plugin.url(descriptor))
        {
            return url;
        }
        if let Some(url) = self.url_override.as_ref().and_then(|rule| rule(descriptor)) {
            return url;
        }

        let paths = &self.config.paths;
        let base = if descriptor.is_resource {
            &paths.source_url
        } else {
            &paths.output_url
        };
        join_url(base, descriptor.name())
    }

    pub fn urls(&self, list: &[FileDescriptor]) -> Vec<String> {
        list.iter().map(|d| self.url_for(d)).collect()
    }
}

fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}
