//! Static resources served from a directory tree.
//!
//! - **`registry`**: name and alias lookup, built by scanning a root directory
//! - **`file`**: one file-backed payload with a reference-counted cache

pub mod file;
pub mod registry;

pub use file::{Resource, ResourceError, ResourceLease, ResourceStats};
pub use registry::ResourceRegistry;
