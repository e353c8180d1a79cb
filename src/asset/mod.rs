//! Asset model: kinds, descriptors, queues and header scanning.

mod descriptor;
mod kind;
pub mod minify;
mod queue;
pub mod scan;

// Types
pub use descriptor::FileDescriptor;
pub use kind::AssetKind;
pub use queue::{DEFAULT_QUEUE, OutputList, Queues};

// Scanning (pure functions)
pub use scan::{HeaderMarkers, scan_file, scan_header};
