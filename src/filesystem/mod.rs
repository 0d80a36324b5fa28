//! Filesystem access for the reconciliation engine.
//!
//! The engine only talks to trees through [`FilesystemProvider`], so it never
//! needs to know whether a location is a local path, a FUSE mount or something
//! more exotic. [`LocalProvider`] is the implementation used by the binary.

mod entry;
mod local;
mod provider;

pub use entry::{Children, Entry, EntryKind, Node};
#[cfg(test)]
pub use local::LocalPath;
pub use local::LocalProvider;
pub use provider::{FilesystemProvider, ProviderError};
