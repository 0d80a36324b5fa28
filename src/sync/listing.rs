use std::io::Write;

use snafu::{ResultExt, Snafu};

use crate::filesystem::{FilesystemProvider, ProviderError};

/// Writes the location of every regular file under `source`, one per line.
///
/// Directories are walked with an explicit stack; siblings come out in name
/// order. Returns the number of files listed.
pub fn list_files<P: FilesystemProvider>(
    provider: &P,
    source: &P::Location,
    out: &mut impl Write,
) -> Result<u64, ListingError> {
    let entry = match provider.query_metadata(source) {
        Err(err) if err.is_not_found() => {
            return SourceNotFoundSnafu {
                location: source.to_string(),
            }
            .fail();
        }
        result => result.context(MetadataSnafu {
            location: source.to_string(),
        })?,
    };

    if !entry.is_dir() {
        writeln!(out, "{source}").context(WriteSnafu)?;
        return Ok(1);
    }

    let mut listed = 0u64;
    let mut stack = vec![source.clone()];
    while let Some(directory) = stack.pop() {
        let mut children = provider
            .enumerate_children(&directory, &[])
            .context(EnumerateSnafu {
                location: directory.to_string(),
            })?;
        children.files.sort_by(|a, b| a.entry.name.cmp(&b.entry.name));
        children.dirs.sort_by(|a, b| b.entry.name.cmp(&a.entry.name));

        for file in &children.files {
            writeln!(out, "{}", file.location).context(WriteSnafu)?;
            listed += 1;
        }
        stack.extend(children.dirs.into_iter().map(|dir| dir.location));
    }

    Ok(listed)
}

#[derive(Debug, Snafu)]
pub enum ListingError {
    #[snafu(display("No such file or directory: {}", location))]
    SourceNotFound { location: String },
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
    #[snafu(display("Failed to write the listing"))]
    WriteError { source: std::io::Error },
}
