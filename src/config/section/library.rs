//! `[[library]]` plugin bindings.
//!
//! Each entry binds one library plugin, in order. The order matters: it is
//! the order plugins are asked for unknown names and the order in which they
//! pull their entries out before concatenation.
//!
//! # Example
//!
//! ```toml
//! [[library]]
//! kind = "cdn"
//! prefix = "lib/"
//! base_url = "https://cdn.jsdelivr.net/npm"
//! version = "2024.1"
//! packages."lib/jquery.js" = { path = "jquery@3.7.1/dist/jquery.js", provides = ["lib/$.js"] }
//!
//! [[library]]
//! kind = "toolkit"
//! prefix = "ui/"
//! base_url = "https://static.example.com/ui/2.3.0"
//! combo_url = "https://static.example.com/combo?"
//! version = "2.3.0"
//! modules."ui/dom.js" = { path = "dom/dom-min.js" }
//! modules."ui/anim.js" = { path = "anim/anim-min.js", requires = ["ui/dom.js"] }
//!
//! [[library]]
//! kind = "fetch"
//! packages."vendor/lodash.js" = "https://unpkg.com/lodash@4.17.21/lodash.js"
//! ```

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::util::is_http_url;
use crate::config::{ConfigDiagnostics, FieldPath};

/// One `[[library]]` entry, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LibraryBinding {
    Cdn(CdnConfig),
    Toolkit(ToolkitConfig),
    Fetch(FetchConfig),
}

impl LibraryBinding {
    pub const FIELD: FieldPath = FieldPath::new("library");

    /// Identifier stamped on descriptors (`id` if set, else the kind).
    pub fn id(&self) -> &str {
        match self {
            Self::Cdn(c) => c.id.as_deref().unwrap_or("cdn"),
            Self::Toolkit(c) => c.id.as_deref().unwrap_or("toolkit"),
            Self::Fetch(c) => c.id.as_deref().unwrap_or("fetch"),
        }
    }

    /// Validate every binding, including identifier uniqueness.
    pub fn validate_all(bindings: &[Self], diag: &mut ConfigDiagnostics) {
        let mut seen = FxHashSet::default();
        for (idx, binding) in bindings.iter().enumerate() {
            if !seen.insert(binding.id()) {
                diag.error_with_hint(
                    Self::FIELD,
                    format!("[{idx}] duplicate library id `{}`", binding.id()),
                    "set a distinct `id` on one of them",
                );
            }
            binding.validate(idx, diag);
        }
    }

    fn validate(&self, idx: usize, diag: &mut ConfigDiagnostics) {
        match self {
            Self::Cdn(c) => {
                check_prefix(idx, &c.prefix, diag);
                check_url(idx, "base_url", &c.base_url, diag);
                for (name, package) in &c.packages {
                    if !name.starts_with(&c.prefix) {
                        diag.error(
                            Self::FIELD,
                            format!("[{idx}] package `{name}` is outside prefix `{}`", c.prefix),
                        );
                    }
                    if package.path.is_empty() {
                        diag.error(Self::FIELD, format!("[{idx}] package `{name}` has no path"));
                    }
                }
            }
            Self::Toolkit(c) => {
                check_prefix(idx, &c.prefix, diag);
                check_url(idx, "base_url", &c.base_url, diag);
                if let Some(combo) = &c.combo_url {
                    check_url(idx, "combo_url", combo, diag);
                }
                for (name, module) in &c.modules {
                    for dep in &module.requires {
                        if !c.modules.contains_key(dep) {
                            diag.error(
                                Self::FIELD,
                                format!("[{idx}] module `{name}` requires unknown module `{dep}`"),
                            );
                        }
                    }
                }
            }
            Self::Fetch(c) => {
                for (name, url) in &c.packages {
                    if !is_http_url(url) {
                        diag.error(
                            Self::FIELD,
                            format!("[{idx}] package `{name}` has invalid url `{url}`"),
                        );
                    }
                }
            }
        }
    }
}

fn check_prefix(idx: usize, prefix: &str, diag: &mut ConfigDiagnostics) {
    if prefix.is_empty() {
        diag.error_with_hint(
            LibraryBinding::FIELD,
            format!("[{idx}] prefix is empty"),
            "a library must own a namespace such as `lib/`",
        );
    }
}

fn check_url(idx: usize, field: &str, value: &str, diag: &mut ConfigDiagnostics) {
    if !is_http_url(value) {
        diag.error(
            LibraryBinding::FIELD,
            format!("[{idx}] {field} `{value}` is not an http(s) URL"),
        );
    }
}

// ============================================================================
// Per-kind settings
// ============================================================================

/// Remote libraries served from a CDN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    pub id: Option<String>,
    /// Names under this prefix belong to the library.
    pub prefix: String,
    pub base_url: String,
    /// Signature of every package without its own version.
    pub version: String,
    pub packages: BTreeMap<String, CdnPackage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnPackage {
    /// Remote path below `base_url`.
    pub path: String,
    pub version: Option<String>,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
}

/// Vendored UI toolkit described by a module table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub id: Option<String>,
    pub prefix: String,
    pub base_url: String,
    /// Combo handler; when set, all toolkit entries merge into one URL.
    pub combo_url: Option<String>,
    pub version: String,
    pub modules: BTreeMap<String, ToolkitModule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitModule {
    pub path: String,
    pub requires: Vec<String>,
}

/// Remote packages downloaded into the source tree on first use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub id: Option<String>,
    /// Asset name -> remote URL.
    pub packages: BTreeMap<String, String>,
}
