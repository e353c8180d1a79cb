//! Default transforms used by the compile stage.
//!
//! The stage treats a transform as a black box that turns one source file
//! into one output file. Two implementations ship:
//!
//! - [`CommandTransformer`]: an external command template
//! - [`BuiltinTransformer`]: in-process minification (oxc / lightningcss)

mod builtin;
mod command;

pub use builtin::BuiltinTransformer;
pub use command::{CommandTransformer, resolve_args};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::asset::AssetKind;
use crate::config::AssetsConfig;

/// One file to transform.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub kind: AssetKind,
    pub source: PathBuf,
    /// Where the result must end up.
    pub destination: PathBuf,
    /// Service mode only: scratch path a background job writes before
    /// renaming onto `destination`.
    pub background: Option<PathBuf>,
    /// Permission bits for files the transform publishes itself.
    pub file_mode: Option<u32>,
}

/// What a finished transform reports back, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub success: bool,
    /// Exit status of an external process.
    pub status: Option<i32>,
    pub stdout: String,
}

impl TransformReport {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: None,
            stdout: message.into(),
        }
    }
}

/// A pluggable per-file transform.
pub trait Transformer: Send + Sync {
    /// Run to completion; on success `destination` holds the output.
    fn transform(&self, request: &TransformRequest) -> Result<TransformReport>;

    /// Start without waiting. The job publishes `destination` on its own,
    /// writing through `background` and renaming so readers never see a
    /// partial file.
    fn spawn(&self, request: TransformRequest) -> Result<()>;
}

/// Transformer selected by `[build.compile]`.
pub fn from_config(config: &AssetsConfig) -> Arc<dyn Transformer> {
    let command = &config.build.compile.command;
    if command.is_empty() {
        Arc::new(BuiltinTransformer)
    } else {
        Arc::new(CommandTransformer::new(command.clone(), config.get_root()))
    }
}
