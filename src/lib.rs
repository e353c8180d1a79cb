//! Dependency-aware, cache-coherent stylesheet and script pipeline.
//!
//! Named assets are resolved against a source tree and a set of library
//! plugins, compiled one by one, merged, and published under
//! content-addressed names. The result is a list of URLs (or ready-made
//! `<link>`/`<script>` tags) a page can reference.
//!
//! ```ignore
//! let config = AssetsConfig::load(Path::new("assets.toml"))?;
//! let css = Pipeline::new(AssetKind::Css, config)?;
//! css.add("css/site.css", None);
//! for tag in css.render(None, &[]) {
//!     println!("{tag}");
//! }
//! ```

pub mod asset;
pub mod cache;
pub mod cli;
pub mod compile;
pub mod config;
pub mod library;
pub mod logger;
pub mod pipeline;
pub mod signature;
pub mod utils;

pub use asset::{AssetKind, FileDescriptor};
pub use cache::{CacheEntry, CacheKey, DiskCache, MemoryCache, MetadataCache};
pub use compile::{TransformReport, TransformRequest, Transformer};
pub use config::AssetsConfig;
pub use library::{CompileOutcome, Libraries, LibraryPlugin};
pub use pipeline::{Pipeline, PipelineBuilder, emit};
pub use signature::{SignatureKind, SignatureProvider};
