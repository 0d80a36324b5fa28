use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::filesystem::{Children, FilesystemProvider, Node, ProviderError};
use crate::sync::mutation::{MutationError, MutationExecutor};
use crate::sync::progress::OperationProgress;
use crate::sync::{DiffLevel, OperationLog, Pending, SyncOptions, WorkList, diff_nodes};

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub files_examined: u64,
    pub operations: u64,
}

/// Walks source and destination in lock-step and brings the destination in line with the source.
///
/// Traversal is driven by a [`WorkList`] instead of recursion, so tree depth is
/// bounded by memory only. The top-level destination is excluded from every
/// source listing, which keeps a destination nested inside the source from
/// being copied into itself.
pub struct Synchronizer<'a, P: FilesystemProvider, O> {
    provider: &'a P,
    options: &'a SyncOptions,
    log: &'a mut O,
}

impl<'a, P, O> Synchronizer<'a, P, O>
where
    P: FilesystemProvider,
    O: OperationLog<P::Location>,
{
    pub fn new(provider: &'a P, options: &'a SyncOptions, log: &'a mut O) -> Self {
        Self {
            provider,
            options,
            log,
        }
    }

    pub fn run(
        self,
        source: &P::Location,
        destination: &P::Location,
    ) -> Result<SyncSummary, SyncError> {
        let Self {
            provider,
            options,
            log,
        } = self;

        match provider.query_metadata(source) {
            Err(err) if err.is_not_found() => {
                return SourceNotFoundSnafu {
                    location: source.to_string(),
                }
                .fail();
            }
            result => {
                result.context(MetadataSnafu {
                    location: source.to_string(),
                })?;
            }
        }

        info!("Synchronizing {} into {}", source, destination);
        let exclude = [destination.clone()];
        let mut executor = MutationExecutor::new(provider, options, log);
        let mut work_list = WorkList::seeded(source.clone(), destination.clone());
        let mut progress = OperationProgress::stderr();
        let mut files_examined = 0u64;

        while let Some(pending) = work_list.pop() {
            progress.tick(work_list.len(), files_examined);

            files_examined += match pending {
                Pending::Reconcile {
                    source,
                    destination,
                } => Self::reconcile(
                    provider,
                    options,
                    &mut executor,
                    &mut work_list,
                    &exclude,
                    source,
                    destination,
                )?,
                Pending::Populate {
                    source,
                    destination,
                } => executor
                    .copy_directory(&source, &destination, &exclude, &mut work_list)
                    .context(MutationSnafu)?,
            };
        }

        progress.finish(files_examined);

        let summary = SyncSummary {
            files_examined,
            operations: executor.operations(),
        };
        info!(
            "Examined {} files, issued {} operations",
            summary.files_examined, summary.operations
        );
        Ok(summary)
    }

    /// Processes one directory pair whose sides may both hold content. Returns the
    /// number of source files examined.
    fn reconcile(
        provider: &P,
        options: &SyncOptions,
        executor: &mut MutationExecutor<'_, P, O>,
        work_list: &mut WorkList<P::Location>,
        exclude: &[P::Location],
        source: P::Location,
        destination: P::Location,
    ) -> Result<u64, SyncError> {
        debug!("Reconciling {} with {}", source, destination);

        let source_children = Self::source_listing(provider, &source, exclude)?;
        let destination_children = match provider.enumerate_children(&destination, &[]) {
            Ok(children) => children,
            Err(err) if err.is_not_found() => {
                debug!("{} does not exist yet", destination);
                executor
                    .create_directory(&destination)
                    .context(MutationSnafu)?;
                Children::default()
            }
            Err(err) => {
                return Err(err).context(EnumerateSnafu {
                    location: destination.to_string(),
                });
            }
        };
        let files_examined = source_children.files.len() as u64;

        let dir_diff = diff_nodes(
            destination_children.dirs,
            source_children.dirs,
            DiffLevel::Directories,
            options.size_only,
        );

        work_list.push_ascending(dir_diff.missing.into_iter().map(|dir| Pending::Populate {
            destination: provider.child_location(&destination, dir.name()),
            source: dir.location,
        }));
        for dir in dir_diff.extra {
            executor.delete_recursive(dir).context(MutationSnafu)?;
        }

        let file_diff = diff_nodes(
            destination_children.files,
            source_children.files,
            DiffLevel::Files,
            options.size_only,
        );
        if file_diff.is_dirty() {
            executor.describe(&destination, &file_diff);
        }

        for file in &file_diff.missing {
            let target = provider.child_location(&destination, file.name());
            executor
                .copy_file(&file.location, &target, false)
                .context(MutationSnafu)?;
        }
        for (stale, fresh) in &file_diff.changed {
            executor
                .copy_file(&fresh.location, &stale.location, true)
                .context(MutationSnafu)?;
        }
        for file in file_diff.extra {
            executor.delete_recursive(file).context(MutationSnafu)?;
        }

        work_list.push_ascending(dir_diff.same.into_iter().map(|(dst, src)| {
            Pending::Reconcile {
                source: src.location,
                destination: dst.location,
            }
        }));

        Ok(files_examined)
    }

    /// Lists the source side. A file stands in for a directory holding only itself.
    fn source_listing(
        provider: &P,
        source: &P::Location,
        exclude: &[P::Location],
    ) -> Result<Children<P::Location>, SyncError> {
        let entry = provider.query_metadata(source).context(MetadataSnafu {
            location: source.to_string(),
        })?;
        if !entry.is_dir() {
            return Ok(Children::single_file(Node::new(source.clone(), entry)));
        }

        provider
            .enumerate_children(source, exclude)
            .context(EnumerateSnafu {
                location: source.to_string(),
            })
    }
}

#[derive(Debug, Snafu)]
pub enum SyncError {
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
    #[snafu(display("Failed to apply a change"))]
    MutationError { source: MutationError },
}
