//! Dotted config field paths.

use owo_colors::OwoColorize;
use std::fmt;

/// Where a diagnostic points, e.g. `build.compile.command`.
///
/// Sections expose their fields as associated constants:
///
/// ```ignore
/// diag.error(BuildConfig::SHARD, "must be at most 16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).cyan())
    }
}
