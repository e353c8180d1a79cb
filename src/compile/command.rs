//! External command transform.
//!
//! ```toml
//! [build.compile]
//! command = ["esbuild", "$TOLA_INPUT", "--minify", "--outfile=$TOLA_OUTPUT"]
//! ```
//!
//! In service mode `$TOLA_OUTPUT` is the background scratch path; the file
//! is renamed onto the real destination once the command exits cleanly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rustc_hash::FxHashMap;

use crate::debug;
use crate::utils::exec::{Cmd, SILENT_FILTER};
use crate::utils::path::publish_staged;

use super::{TransformReport, TransformRequest, Transformer};

// ============================================================================
// Template Variables
// ============================================================================

/// Build `$TOLA_*` variables for one request
fn build_tola_vars(request: &TransformRequest, root: &Path) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert("TOLA_INPUT".into(), request.source.display().to_string());
    vars.insert("TOLA_OUTPUT".into(), request.destination.display().to_string());
    vars.insert(
        "TOLA_BACKGROUND".into(),
        request
            .background
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    );
    vars.insert("TOLA_KIND".into(), request.kind.ext().into());
    vars.insert("TOLA_ROOT".into(), root.display().to_string());
    vars
}

/// Resolve `$TOLA_*` variables in command arguments
///
/// Longer keys are substituted first so `$TOLA_ROOT` never eats a
/// `$TOLA_ROOTS` style variable.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.iter().collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in &keys {
                let pattern = format!("${}", key);
                result = result.replace(&pattern, value);
            }
            result
        })
        .collect()
}

// ============================================================================
// Transformer
// ============================================================================

/// Runs a configured command template per file.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    command: Vec<String>,
    root: PathBuf,
}

impl CommandTransformer {
    pub fn new(command: Vec<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            command,
            root: root.into(),
        }
    }

    fn prepare(&self, request: &TransformRequest) -> Cmd {
        let vars = build_tola_vars(request, &self.root);
        let resolved = resolve_args(&self.command, &vars);
        Cmd::from_slice(&resolved).cwd(&self.root).envs(&vars)
    }
}

impl Transformer for CommandTransformer {
    fn transform(&self, request: &TransformRequest) -> Result<TransformReport> {
        let output = self.prepare(request).filter(&SILENT_FILTER).output()?;
        // a failing command explains itself on stderr
        let stdout = if output.success || output.stderr.is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Ok(TransformReport {
            success: output.success,
            status: output.status,
            stdout,
        })
    }

    fn spawn(&self, request: TransformRequest) -> Result<()> {
        let Some(scratch) = request.background.clone() else {
            return self.prepare(&request).spawn_detached(|| {});
        };
        let staged = TransformRequest {
            destination: scratch.clone(),
            ..request.clone()
        };
        let destination = request.destination;
        let file_mode = request.file_mode;
        self.prepare(&staged)
            .spawn_detached(move || publish_scratch(&scratch, &destination, file_mode))
    }
}

/// Move a finished background result into place; empty results are dropped.
fn publish_scratch(scratch: &Path, destination: &Path, file_mode: Option<u32>) {
    let produced = fs::metadata(scratch).map(|m| m.len()).unwrap_or(0);
    if produced == 0 {
        debug!("compile"; "background job left no output for {}", destination.display());
        let _ = fs::remove_file(scratch);
        return;
    }
    if let Err(e) = publish_staged(scratch, destination, file_mode) {
        debug!("compile"; "background publish failed: {:#}", e);
        let _ = fs::remove_file(scratch);
    }
}
