//! Pipeline configuration management for `assets.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build] and [build.compile]
//! │   ├── library    # [[library]]
//! │   └── paths      # [paths]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # URL checks, path expansion, config lookup
//! └── mod.rs         # AssetsConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section           | Purpose                                          |
//! |-------------------|--------------------------------------------------|
//! | `[paths]`         | Source/output directories and their URL prefixes |
//! | `[build]`         | Concatenation, signatures, sharding, modes       |
//! | `[build.compile]` | Compile mode and external command template       |
//! | `[[library]]`     | Ordered library plugin bindings                  |

pub mod section;
pub mod types;
mod util;

pub use section::{
    BuildConfig, CdnConfig, CdnPackage, CompileConfig, CompileMode, FetchConfig, LibraryBinding,
    PathsConfig, ToolkitConfig, ToolkitModule,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath, Severity};
pub use util::find_config_file;

use crate::log;
use crate::signature::SignatureProvider;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "assets.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `assets.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub paths: PathsConfig,

    pub build: BuildConfig,

    #[serde(rename = "library")]
    pub libraries: Vec<LibraryBinding>,
}

impl AssetsConfig {
    /// Load, normalize and validate a config file.
    ///
    /// Unknown fields are reported as warnings; validation errors are
    /// returned together as [`ConfigError::Diagnostics`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_path(path)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.config_path = crate::utils::path::normalize_path(path);
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string (no normalization).
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set the root and resolve every configured path against it.
    pub fn finalize(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        self.paths.normalize(&root);
        self.root = root;
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Signature strategy selected by `[build]`.
    pub fn signature_provider(&self) -> SignatureProvider {
        SignatureProvider::new(
            self.build.signature,
            self.build.version.as_deref().unwrap_or_default(),
        )
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect all diagnostics without failing.
    pub fn diagnostics(&self) -> ConfigDiagnostics {
        let mut diag = ConfigDiagnostics::new();
        self.paths.validate(&self.root, &mut diag);
        self.build.validate(&mut diag);
        LibraryBinding::validate_all(&self.libraries, &mut diag);
        diag
    }

    /// Validate configuration, returning all errors at once.
    pub fn validate(&self) -> Result<()> {
        let diag = self.diagnostics();
        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config rooted at `root`. Panics on unknown fields to catch typos.
#[cfg(test)]
pub fn test_parse_config(root: &Path, content: &str) -> AssetsConfig {
    let (mut parsed, ignored) = AssetsConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed.finalize(root);
    parsed
}

// ============================================================================
// tests
// ============================================================================
