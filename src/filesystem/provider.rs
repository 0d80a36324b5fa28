use std::fmt::{Debug, Display};

use snafu::Snafu;

use crate::filesystem::{Children, Entry};

/// Access to one filesystem tree.
///
/// Every call blocks until the underlying operation completes. Locations are
/// opaque to callers; only the provider knows how to build and compare them.
pub trait FilesystemProvider {
    type Location: Clone + Debug + Display;

    /// Parses a user supplied path or URI into a location.
    fn resolve(&self, argument: &str) -> Result<Self::Location, ProviderError>;

    fn query_metadata(&self, location: &Self::Location) -> Result<Entry, ProviderError>;

    /// Lists the children of a directory, leaving out any child equal to a member of `exclude`.
    /// Symbolic links among the children are never followed, and children that are neither
    /// regular files nor directories are left out.
    fn enumerate_children(
        &self,
        location: &Self::Location,
        exclude: &[Self::Location],
    ) -> Result<Children<Self::Location>, ProviderError>;

    /// Copies file contents, calling `on_progress(transferred, total)` as bytes move.
    fn copy(
        &self,
        source: &Self::Location,
        destination: &Self::Location,
        overwrite: bool,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), ProviderError>;

    /// Removes a file or an empty directory.
    fn delete(&self, location: &Self::Location) -> Result<(), ProviderError>;

    /// Creates a single directory. Fails with [`ProviderError::AlreadyExists`] when it is already there.
    fn make_directory(&self, location: &Self::Location) -> Result<(), ProviderError>;

    fn locations_equal(&self, a: &Self::Location, b: &Self::Location) -> bool;

    fn child_location(&self, parent: &Self::Location, name: &str) -> Self::Location;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("No such file or directory: {}", location))]
    NotFound { location: String },
    #[snafu(display("Already exists: {}", location))]
    AlreadyExists { location: String },
    #[snafu(display("Not a regular file or directory: {}", location))]
    UnsupportedKind { location: String },
    #[snafu(display("Cannot resolve '{}': {}", argument, reason))]
    InvalidLocation { argument: String, reason: String },
    #[snafu(display("I/O failure at {}", location))]
    Io {
        location: String,
        source: std::io::Error,
    },
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProviderError::AlreadyExists { .. })
    }

    /// Maps an I/O error onto the provider taxonomy, keeping the two kinds callers act on.
    pub fn from_io(location: impl Display, source: std::io::Error) -> Self {
        let location = location.to_string();
        match source.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound { location },
            std::io::ErrorKind::AlreadyExists => ProviderError::AlreadyExists { location },
            _ => ProviderError::Io { location, source },
        }
    }
}
