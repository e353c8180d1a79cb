//! External command execution for compile templates.
//!
//! A [`Cmd`] is built from a resolved template and either waited on
//! ([`Cmd::output`]) or left running ([`Cmd::spawn_detached`]).
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let out = Cmd::from_slice(&["esbuild", "a.js", "--minify"]).cwd(root).output()?;
//! Cmd::from_slice(&["sass", "in.scss", "out.css"]).spawn_detached(|| {})?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::LazyLock,
};

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ansi regex"));

// ============================================================================
// Builder
// ============================================================================

#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    filter: Option<&'static FilterRule>,
}

/// What a finished process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOutput {
    pub success: bool,
    /// Exit code, `None` when killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Cmd {
    /// Program plus arguments, e.g. `["npx", "esbuild", "--minify"]`.
    /// Empty arguments (unset template variables) are dropped.
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter().map(|s| s.as_ref().to_owned());
        let program = iter.next().unwrap_or_default();
        Self {
            program,
            args: iter.filter(|a| !a.is_empty()).collect(),
            ..Default::default()
        }
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Extra environment variables for the child.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    /// Which stderr lines get logged.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Wait for the process. A non-zero exit is reported, not an error;
    /// only failing to start one is.
    pub fn output(self) -> Result<CmdOutput> {
        let name = self.program_name();
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to execute `{name}`"))?;

        let out = CmdOutput {
            success: output.status.success(),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        };
        self.filter.unwrap_or(&EMPTY_FILTER).log(&name, &out.stderr);
        Ok(out)
    }

    /// Start the process and return at once.
    ///
    /// The child is reaped on a background thread so no zombie is left
    /// behind; `on_success` runs there after a zero exit.
    pub fn spawn_detached<F>(self, on_success: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = self.program_name();
        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))?;

        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => on_success(),
            Ok(status) => {
                crate::debug!("compile"; "background `{}` exited with {}", name, status);
            }
            Err(e) => crate::debug!("compile"; "background `{}` lost: {}", name, e),
        });
        Ok(())
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Decides which stderr lines of a command reach the log.
pub struct FilterRule {
    /// Lines starting with any of these are dropped.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log the lines of `output` that pass the filter, under `name`.
    pub fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .map(strip_ansi)
            .filter(|line| !self.should_skip(line.trim()))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Log everything.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Log nothing.
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

fn strip_ansi(s: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(s, "")
}
