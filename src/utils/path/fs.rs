//! Filesystem helpers shared by the pipeline stages.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `ensure_dir` - create a directory tree with configured permissions
//! - `publish` - write a file through a temp file and rename it into place

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Mode for published files when `build.file_mode` is unset; staging files
/// start out owner-only.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Create `dir` and its parents, applying `mode` to directories created here.
pub fn ensure_dir(dir: &Path, mode: Option<u32>) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    if let Some(mode) = mode {
        set_mode(dir, mode)?;
    }
    Ok(())
}

/// Atomically publish a file at `target`.
///
/// `write` fills a temp file created next to `target`; the temp file then
/// gets `file_mode` (or [`DEFAULT_FILE_MODE`]) applied and is renamed over
/// `target`. Readers never observe a
/// partially written file. Concurrent publishers of identical content are
/// harmless: the last rename wins with the same bytes.
pub fn publish<F>(target: &Path, dir_mode: Option<u32>, file_mode: Option<u32>, write: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let parent = target
        .parent()
        .with_context(|| format!("`{}` has no parent directory", target.display()))?;
    ensure_dir(parent, dir_mode)
        .with_context(|| format!("create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    write(tmp.as_file_mut()).with_context(|| format!("write temp file for {}", target.display()))?;
    tmp.as_file_mut().flush()?;

    set_mode(tmp.path(), file_mode.unwrap_or(DEFAULT_FILE_MODE))?;

    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("rename temp file to {}", target.display()))?;
    Ok(())
}

/// Rename an already written staging file into place with `file_mode` (or
/// [`DEFAULT_FILE_MODE`]) applied.
pub fn publish_staged(staging: &Path, target: &Path, file_mode: Option<u32>) -> Result<()> {
    set_mode(staging, file_mode.unwrap_or(DEFAULT_FILE_MODE))
        .with_context(|| format!("set mode on {}", staging.display()))?;
    fs::rename(staging, target)
        .with_context(|| format!("rename {} → {}", staging.display(), target.display()))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
