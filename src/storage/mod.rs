//! File system storage management
//!
//! Handles the filesystem capability and virtual path resolution.

pub mod filesystem;
pub mod validation;

pub use filesystem::{Filesystem, LocalFilesystem};
pub use validation::{resolve_virtual_path, virtual_to_real_path};
