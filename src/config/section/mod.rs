//! Configuration section definitions.

mod build;
mod library;
mod paths;

pub use build::{BuildConfig, CompileConfig, CompileMode};
pub use library::{
    CdnConfig, CdnPackage, FetchConfig, LibraryBinding, ToolkitConfig, ToolkitModule,
};
pub use paths::PathsConfig;
