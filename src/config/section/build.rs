//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! concatenate = true
//! separator = true          # `/* name */` comment before each merged file
//! signature = "hash"        # mtime | hash | version
//! negative_ttl = 60         # seconds a failed compile is not retried
//! shard = 2                 # output/ab/abcdef....css
//! file_mode = 0o644
//!
//! [build.compile]
//! enable = true
//! mode = "sync"             # sync | service
//! command = ["esbuild", "$TOLA_INPUT", "--minify", "--outfile=$TOLA_OUTPUT"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::signature::SignatureKind;
use crate::utils::hash::DIGEST_LEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub compile: CompileConfig,
    pub concatenate: bool,
    pub separator: bool,
    pub signature: SignatureKind,
    /// Token used by the `version` signature strategy.
    pub version: Option<String>,
    /// Seconds a negative compile entry stays in the cache.
    pub negative_ttl: u64,
    /// Leading digest characters used as a subdirectory (0 = flat).
    pub shard: usize,
    pub dir_mode: Option<u32>,
    pub file_mode: Option<u32>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compile: CompileConfig::default(),
            concatenate: true,
            separator: true,
            signature: SignatureKind::default(),
            version: None,
            negative_ttl: 60,
            shard: 0,
            dir_mode: None,
            file_mode: None,
        }
    }
}

impl BuildConfig {
    pub const VERSION: FieldPath = FieldPath::new("build.version");
    pub const SHARD: FieldPath = FieldPath::new("build.shard");
    pub const DIR_MODE: FieldPath = FieldPath::new("build.dir_mode");
    pub const FILE_MODE: FieldPath = FieldPath::new("build.file_mode");

    #[inline]
    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let version = self.version.as_deref().unwrap_or_default();
        match self.signature {
            SignatureKind::Version if version.trim().is_empty() => {
                diag.error_with_hint(
                    Self::VERSION,
                    "signature = \"version\" needs a version token",
                    "set `build.version`, e.g. to the deploy number",
                );
            }
            SignatureKind::Mtime | SignatureKind::Hash if !version.is_empty() => {
                diag.warn(Self::VERSION, "ignored unless signature = \"version\"");
            }
            _ => {}
        }

        if self.shard > DIGEST_LEN {
            diag.error(
                Self::SHARD,
                format!("shard must be at most {DIGEST_LEN} characters, got {}", self.shard),
            );
        }

        for (field, mode) in [(Self::DIR_MODE, self.dir_mode), (Self::FILE_MODE, self.file_mode)] {
            if let Some(mode) = mode
                && mode > 0o777
            {
                diag.error_with_hint(
                    field,
                    format!("{mode:#o} is not a permission mode"),
                    "write modes as octal integers, e.g. 0o644",
                );
            }
        }

        self.compile.validate(diag);
    }
}

/// How the default transform is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Run the transform and wait for it.
    #[default]
    Sync,
    /// Spawn the transform and serve the source until it lands.
    Service,
}

/// `[build.compile]` sub-section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub enable: bool,
    pub mode: CompileMode,
    /// Command template; empty selects the built-in minifier.
    ///
    /// Placeholders: `$TOLA_INPUT`, `$TOLA_OUTPUT`, `$TOLA_BACKGROUND`.
    pub command: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            enable: true,
            mode: CompileMode::Sync,
            command: Vec::new(),
        }
    }
}

impl CompileConfig {
    pub const COMMAND: FieldPath = FieldPath::new("build.compile.command");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        let Some(program) = self.command.first() else {
            return;
        };
        if program.trim().is_empty() {
            diag.error(Self::COMMAND, "command program is empty");
        } else if !program.contains(std::path::MAIN_SEPARATOR) && which::which(program).is_err() {
            diag.error_with_hint(
                Self::COMMAND,
                format!("`{program}` not found in PATH"),
                "install it or remove `command` to use the built-in minifier",
            );
        }
    }
}
