//! Vendored UI toolkit with a module table.
//!
//! Modules ship minified, so compiling only flips them to generated. When a
//! combo handler is configured, every toolkit entry in a concatenation batch
//! collapses into a single combo request.

use crate::asset::FileDescriptor;
use crate::utils::hash;

use super::cdn::{REMOTE_PATH, join_url};
use super::{CompileOutcome, LibraryPlugin, partition_owned};

pub struct ToolkitLibrary {
    id: String,
    config: crate::config::ToolkitConfig,
}

impl ToolkitLibrary {
    pub fn new(id: impl Into<String>, config: crate::config::ToolkitConfig) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }

    /// One descriptor standing for all `entries`, linked through the combo URL.
    fn combine(&self, combo_url: &str, entries: &[FileDescriptor]) -> FileDescriptor {
        let paths: Vec<&str> = entries
            .iter()
            .filter_map(|d| d.extra.get(REMOTE_PATH).map(String::as_str))
            .collect();
        let names: Vec<&str> = entries.iter().map(FileDescriptor::name).collect();
        let ext = entries
            .first()
            .and_then(FileDescriptor::kind)
            .map_or("js", |k| k.ext());

        let mut combined = FileDescriptor::library(
            format!("{}combo-{}.{ext}", self.config.prefix, hash::digest(&names)),
            &self.id,
            &self.config.version,
        )
        .with_url(format!("{combo_url}{}", paths.join("&")))
        .with_provides(names.iter().map(|n| (*n).to_owned()).collect());
        combined.is_resource = false;
        combined
    }
}

impl LibraryPlugin for ToolkitLibrary {
    fn id(&self) -> &str {
        &self.id
    }

    fn claims(&self, name: &str) -> bool {
        !self.config.prefix.is_empty() && name.starts_with(&self.config.prefix)
    }

    fn file_data(&self, name: &str) -> Option<FileDescriptor> {
        let module = self.config.modules.get(name)?;
        Some(
            FileDescriptor::library(name, &self.id, &self.config.version)
                .with_dependencies(module.requires.clone())
                .with_extra(REMOTE_PATH, &module.path),
        )
    }

    fn signature(&self, descriptor: &FileDescriptor) -> Option<String> {
        self.config
            .modules
            .contains_key(descriptor.name())
            .then(|| self.config.version.clone())
    }

    fn compile_file(&self, descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        let mut compiled = descriptor.clone();
        compiled.is_resource = false;
        Some(CompileOutcome::Compiled(compiled))
    }

    fn compile_file_service(&self, descriptor: &FileDescriptor) -> Option<CompileOutcome> {
        self.compile_file(descriptor)
    }

    fn cat_files(&self, entries: Vec<FileDescriptor>) -> (Vec<FileDescriptor>, Vec<FileDescriptor>) {
        let (owned, rest) = partition_owned(&self.id, entries);
        match &self.config.combo_url {
            Some(combo_url) if owned.len() > 1 => (vec![self.combine(combo_url, &owned)], rest),
            _ => (owned, rest),
        }
    }

    fn url(&self, descriptor: &FileDescriptor) -> Option<String> {
        let path = descriptor.extra.get(REMOTE_PATH)?;
        Some(join_url(&self.config.base_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ToolkitConfig, ToolkitModule};

    fn toolkit(combo: bool) -> ToolkitLibrary {
        let mut config = ToolkitConfig {
            prefix: "ui/".into(),
            base_url: "https://static.example.com/ui/2.3.0".into(),
            combo_url: combo.then(|| "https://static.example.com/combo?".into()),
            version: "2.3.0".into(),
            ..ToolkitConfig::default()
        };
        config.modules.insert(
            "ui/dom.js".into(),
            ToolkitModule {
                path: "dom/dom-min.js".into(),
                requires: Vec::new(),
            },
        );
        config.modules.insert(
            "ui/anim.js".into(),
            ToolkitModule {
                path: "anim/anim-min.js".into(),
                requires: vec!["ui/dom.js".into()],
            },
        );
        ToolkitLibrary::new("toolkit", config)
    }

    #[test]
    fn test_module_table() {
        let ui = toolkit(false);
        let anim = ui.file_data("ui/anim.js").unwrap();
        assert_eq!(anim.dependencies, vec!["ui/dom.js".to_string()]);
        assert_eq!(anim.signature, "2.3.0");
        assert_eq!(
            ui.url(&anim).unwrap(),
            "https://static.example.com/ui/2.3.0/anim/anim-min.js"
        );
        assert!(ui.file_data("ui/missing.js").is_none());
    }

    #[test]
    fn test_compile_marks_generated() {
        let ui = toolkit(false);
        let dom = ui.file_data("ui/dom.js").unwrap();
        let Some(CompileOutcome::Compiled(compiled)) = ui.compile_file(&dom) else {
            panic!("expected compiled descriptor");
        };
        assert!(!compiled.is_resource);
        assert_eq!(ui.url(&compiled), ui.url(&dom));
    }

    #[test]
    fn test_cat_files_combo() {
        let ui = toolkit(true);
        let entries = vec![
            ui.file_data("ui/dom.js").unwrap(),
            FileDescriptor::resource("app.js", "/src/app.js", "1"),
            ui.file_data("ui/anim.js").unwrap(),
        ];
        let (handled, rest) = ui.cat_files(entries);

        assert_eq!(handled.len(), 1);
        assert_eq!(rest.len(), 1);
        let combo = &handled[0];
        assert_eq!(
            combo.url.as_deref(),
            Some("https://static.example.com/combo?dom/dom-min.js&anim/anim-min.js")
        );
        assert!(combo.names().any(|n| n == "ui/anim.js"));
    }

    #[test]
    fn test_cat_files_without_combo_keeps_entries() {
        let ui = toolkit(false);
        let entries = vec![
            ui.file_data("ui/dom.js").unwrap(),
            ui.file_data("ui/anim.js").unwrap(),
        ];
        let (handled, rest) = ui.cat_files(entries);
        assert_eq!(handled.len(), 2);
        assert!(rest.is_empty());
    }
}
