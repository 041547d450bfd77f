//! Resource providers backing `fn:json-doc`.
//!
//! - [`FilesystemResourceProvider`]: `file:` URIs and relative paths under a sandbox root
//! - [`InMemoryResourceProvider`]: re-exported from `xylem-traits`

mod filesystem;

pub use filesystem::FilesystemResourceProvider;

pub use xylem_traits::InMemoryResourceProvider;
