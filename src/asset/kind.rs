//! Asset kind definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of asset handled by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Stylesheet, emitted as `<link rel="stylesheet">`.
    Css,
    /// Script, emitted as `<script src>`.
    Js,
}

impl AssetKind {
    /// File extension of generated artifacts (without dot).
    pub const fn ext(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// Detect the kind from an asset name's extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "js" | "mjs" => Some(Self::Js),
            _ => None,
        }
    }

    /// Human-readable comment marking where a source starts in a merged file.
    pub fn separator(self, name: &str) -> String {
        // `*/` inside a name would end the comment early
        let name = name.replace("*/", "*\\/");
        format!("/* {name} */\n")
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "css" => Ok(Self::Css),
            "js" => Ok(Self::Js),
            other => Err(format!("unknown asset kind `{other}` (expected css or js)")),
        }
    }
}
