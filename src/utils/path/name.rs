//! Asset name normalization.
//!
//! Asset names are `/`-separated paths relative to the source directory
//! (`css/site.css`, `lib/jquery.js`). Normalization is purely lexical so it
//! works for names that do not exist on disk yet.

/// Collapse `.` and `..` segments, duplicate slashes and a leading `/`.
///
/// `..` never climbs above the root: `../a.css` becomes `a.css`.
///
/// # Example
/// ```ignore
/// assert_eq!(clean_name("css//./base/../site.css"), "css/site.css");
/// ```
pub fn clean_name(name: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Resolve a dependency name declared inside `from`.
///
/// Names starting with `./` or `../` are relative to the directory of `from`;
/// every other name is relative to the source root.
///
/// # Example
/// ```ignore
/// assert_eq!(join_name("css/site.css", "./reset.css"), "css/reset.css");
/// assert_eq!(join_name("css/site.css", "vendor/grid.css"), "vendor/grid.css");
/// ```
pub fn join_name(from: &str, dep: &str) -> String {
    if dep.starts_with("./") || dep.starts_with("../") {
        let dir = match from.rfind('/') {
            Some(idx) => &from[..idx],
            None => "",
        };
        clean_name(&format!("{dir}/{dep}"))
    } else {
        clean_name(dep)
    }
}
