use std::collections::BTreeMap;

use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{FilesystemProvider, ProviderError};

/// Fails if any directory under `source` holds two children whose names differ only by case.
///
/// Such trees cannot be mirrored faithfully onto case-insensitive storage, where
/// one of the two would silently overwrite the other.
pub fn check_case_collisions<P: FilesystemProvider>(
    provider: &P,
    source: &P::Location,
    exclude: &[P::Location],
) -> Result<(), CaseGuardError> {
    let entry = provider.query_metadata(source).context(MetadataSnafu {
        location: source.to_string(),
    })?;
    if !entry.is_dir() {
        return Ok(());
    }

    let mut stack = vec![source.clone()];
    while let Some(directory) = stack.pop() {
        let children = provider
            .enumerate_children(&directory, exclude)
            .context(EnumerateSnafu {
                location: directory.to_string(),
            })?
            .into_nodes();

        let mut by_folded_name: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for child in &children {
            by_folded_name
                .entry(child.name().to_lowercase())
                .or_default()
                .push(child.name());
        }
        if let Some(mut names) = by_folded_name.into_values().find(|names| names.len() > 1) {
            names.sort_unstable();
            return CaseCollisionSnafu {
                directory: directory.to_string(),
                names: names.join(", "),
            }
            .fail();
        }

        stack.extend(
            children
                .into_iter()
                .filter(|child| child.entry.is_dir())
                .map(|child| child.location),
        );
    }

    debug!("No case collisions under {}", source);
    Ok(())
}

#[derive(Debug, Snafu)]
pub enum CaseGuardError {
    #[snafu(display("Names in {} differ only by case: {}", directory, names))]
    CaseCollision { directory: String, names: String },
    #[snafu(display("Failed to read metadata of {}", location))]
    MetadataError {
        location: String,
        source: ProviderError,
    },
    #[snafu(display("Failed to list {}", location))]
    EnumerateError {
        location: String,
        source: ProviderError,
    },
}
