//! Header scanning for dependency markers.
//!
//! Only the top of a file is inspected: markers live in the leading comment
//! block (or as CSS `@import` rules, which must precede all other rules).
//!
//! ```text
//! /*
//!  * @requires ./reset.css, vendor/grid.css
//!  * @provides theme.css
//!  */
//! // @requires lib/jquery.js
//! @import url("./fonts.css");
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::path::join_name;

/// Number of leading bytes inspected for markers.
pub const HEADER_LEN: usize = 4096;

/// `@requires` / `@import` lines, optionally behind comment leaders.
static REQUIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:/\*+|//+|\*+)?[ \t]*@(requires|import)[ \t]+([^\r\n;]+)")
        .expect("valid requires regex")
});

/// `@provides` lines.
static PROVIDES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:/\*+|//+|\*+)?[ \t]*@provides[ \t]+([^\r\n;]+)")
        .expect("valid provides regex")
});

/// Markers found in a file header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMarkers {
    /// Dependency names, declaration order, normalized against the declaring file.
    pub requires: Vec<String>,
    /// Alias names the file supersedes.
    pub provides: Vec<String>,
}

/// Read the header of `path` and extract markers declared by asset `name`.
pub fn scan_file(name: &str, path: &Path) -> io::Result<HeaderMarkers> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut buf)?;
    Ok(scan_header(name, &String::from_utf8_lossy(&buf)))
}

/// Extract markers from header text.
///
/// Duplicates are dropped (first occurrence wins) and a file never requires
/// itself.
pub fn scan_header(name: &str, header: &str) -> HeaderMarkers {
    let mut requires = Vec::new();
    for caps in REQUIRES_RE.captures_iter(header) {
        match &caps[1] {
            // `@import url(x.css) screen;` names one file, the rest is a media query
            "import" => push_names(&mut requires, name, import_target(&caps[2])),
            _ => push_names(&mut requires, name, split_list(&caps[2])),
        }
    }
    requires.retain(|dep| dep != name);

    let mut provides = Vec::new();
    for caps in PROVIDES_RE.captures_iter(header) {
        push_names(&mut provides, name, split_list(&caps[1]));
    }
    HeaderMarkers { requires, provides }
}

fn push_names<'a>(out: &mut Vec<String>, name: &str, raw: impl IntoIterator<Item = &'a str>) {
    for raw in raw {
        let dep = join_name(name, raw);
        if !dep.is_empty() && !out.contains(&dep) {
            out.push(dep);
        }
    }
}

/// First token of an `@import` rule: `url(...)`, a quoted string or a bare name.
fn import_target(rule: &str) -> Option<&str> {
    let rule = rule.trim();
    let end = if rule.starts_with("url(") {
        rule.find(')').map_or(rule.len(), |i| i + 1)
    } else if let Some(quote @ ('"' | '\'')) = rule.chars().next() {
        rule[1..].find(quote).map_or(rule.len(), |i| i + 2)
    } else {
        rule.find([' ', '\t', ',']).unwrap_or(rule.len())
    };
    Some(strip_wrapping(&rule[..end])).filter(|s| !s.is_empty())
}

/// Split a marker argument list, stripping quotes, `url(...)` and a trailing `*/`.
fn split_list(list: &str) -> impl Iterator<Item = &str> {
    let list = list.trim().trim_end_matches("*/").trim();
    list.split([',', ' ', '\t'])
        .map(strip_wrapping)
        .filter(|s| !s.is_empty())
}

fn strip_wrapping(token: &str) -> &str {
    let token = token.trim();
    let token = token
        .strip_prefix("url(")
        .and_then(|t| t.strip_suffix(')'))
        .map_or(token, str::trim);
    token.trim_matches(|c| c == '"' || c == '\'')
}
