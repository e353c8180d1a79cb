//! Path utilities.
//!
//! - [`fs`]: Filesystem helpers (`normalize_path`, atomic `publish`)
//! - [`name`]: Asset name normalization (`join_name`, `clean_name`)

pub mod fs;
pub mod name;

// Re-export commonly used functions
pub use fs::{ensure_dir, normalize_path, publish, publish_staged};
pub use name::{clean_name, join_name};
