use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{FilesystemProvider, Node, ProviderError};
use crate::sync::progress::FileProgress;
use crate::sync::{DiffResult, Operation, OperationLog, Pending, SyncOptions, WorkList};

struct DeleteFrame<L> {
    node: Node<L>,
    pending: Vec<Node<L>>,
}

/// Issues the mutating provider calls of a run and records each one in the operation log.
///
/// In dry-run mode every operation is still recorded, but the provider is only
/// ever asked to read.
pub struct MutationExecutor<'a, P: FilesystemProvider, O> {
    provider: &'a P,
    options: &'a SyncOptions,
    log: &'a mut O,
    operations: u64,
}

impl<'a, P, O> MutationExecutor<'a, P, O>
where
    P: FilesystemProvider,
    O: OperationLog<P::Location>,
{
    pub fn new(provider: &'a P, options: &'a SyncOptions, log: &'a mut O) -> Self {
        Self {
            provider,
            options,
            log,
            operations: 0,
        }
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }

    pub fn describe(&mut self, destination: &P::Location, diff: &DiffResult<Node<P::Location>>) {
        self.log.describe(destination, diff);
    }

    fn record(&mut self, operation: Operation<P::Location>) {
        self.operations += 1;
        self.log.record(operation);
    }

    /// Creates a directory. One that already exists counts as success.
    pub fn create_directory(&mut self, location: &P::Location) -> Result<(), MutationError> {
        self.record(Operation::CreateDirectory {
            location: location.clone(),
        });
        if self.options.dry_run {
            return Ok(());
        }

        match self.provider.make_directory(location) {
            Err(err) if err.is_already_exists() => {
                debug!("Directory {} already exists", location);
                Ok(())
            }
            result => result.context(CreateDirectorySnafu {
                location: location.to_string(),
            }),
        }
    }

    pub fn copy_file(
        &mut self,
        source: &P::Location,
        destination: &P::Location,
        overwrite: bool,
    ) -> Result<(), MutationError> {
        self.record(Operation::CopyFile {
            source: source.clone(),
            destination: destination.clone(),
            overwrite,
        });
        if self.options.dry_run {
            return Ok(());
        }

        let mut progress = FileProgress::stderr();
        self.provider
            .copy(source, destination, overwrite, &mut |transferred, total| {
                progress.update(transferred, total)
            })
            .context(CopySnafu {
                from: source.to_string(),
                to: destination.to_string(),
            })
    }

    /// Deletes `node` and everything beneath it, children before parents.
    pub fn delete_recursive(&mut self, node: Node<P::Location>) -> Result<(), MutationError> {
        let pending = self.children_for_delete(&node)?;
        let mut stack = vec![DeleteFrame { node, pending }];

        while let Some(mut frame) = stack.pop() {
            if let Some(child) = frame.pending.pop() {
                let pending = self.children_for_delete(&child)?;
                stack.push(frame);
                stack.push(DeleteFrame {
                    node: child,
                    pending,
                });
                continue;
            }

            let DeleteFrame { node, .. } = frame;
            self.record(Operation::Delete {
                location: node.location.clone(),
                is_dir: node.entry.is_dir(),
            });
            if !self.options.dry_run {
                self.provider
                    .delete(&node.location)
                    .context(DeleteSnafu {
                        location: node.location.to_string(),
                    })?;
            }
        }

        Ok(())
    }

    // Sorted descending so that popping visits children in ascending name order.
    fn children_for_delete(
        &self,
        node: &Node<P::Location>,
    ) -> Result<Vec<Node<P::Location>>, MutationError> {
        if !node.entry.is_dir() {
            return Ok(Vec::new());
        }
        let mut children = self
            .provider
            .enumerate_children(&node.location, &[])
            .context(EnumerateSnafu {
                location: node.location.to_string(),
            })?
            .into_nodes();
        children.sort_by(|a, b| b.entry.name.cmp(&a.entry.name));
        Ok(children)
    }

    /// Fills a destination directory that does not exist yet.
    ///
    /// Creates `destination`, copies the immediate files of `source` into it and
    /// queues the immediate subdirectories on `work_list`. Returns the number of
    /// source files examined.
    pub fn copy_directory(
        &mut self,
        source: &P::Location,
        destination: &P::Location,
        exclude: &[P::Location],
        work_list: &mut WorkList<P::Location>,
    ) -> Result<u64, MutationError> {
        self.create_directory(destination)?;

        let mut children = self
            .provider
            .enumerate_children(source, exclude)
            .context(EnumerateSnafu {
                location: source.to_string(),
            })?;
        children.files.sort_by(|a, b| a.entry.name.cmp(&b.entry.name));
        children.dirs.sort_by(|a, b| a.entry.name.cmp(&b.entry.name));

        for file in &children.files {
            let target = self.provider.child_location(destination, file.name());
            self.copy_file(&file.location, &target, false)?;
        }

        let subdirectories: Vec<_> = children
            .dirs
            .into_iter()
            .map(|dir| Pending::Populate {
                destination: self.provider.child_location(destination, dir.name()),
                source: dir.location,
            })
            .collect();
        work_list.push_ascending(subdirectories);

        Ok(children.files.len() as u64)
    }
}

#[derive(Debug, Snafu)]
pub enum MutationError {
    #[snafu(display("Failed to create directory {}", location))]
    CreateDirectoryError {
        location: String,
        source: ProviderError,
    },
    #[snafu(display("Failed to copy {} to {}", from, to))]
    CopyError {
        from: String,
        to: String,
        source: ProviderError,
    },
    #[snafu(display("Failed to delete {}", location))]
    DeleteError {
        location: String,
        source: ProviderError,
    },
    #[snafu(display("Failed to list {}", location))]
    EnumerateError {
        location: String,
        source: ProviderError,
    },
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::filesystem::{LocalPath, LocalProvider};

    fn local(path: &Path) -> LocalPath {
        LocalProvider.resolve(path.to_str().unwrap()).unwrap()
    }

    fn node(path: &Path) -> Node<LocalPath> {
        let location = local(path);
        let entry = LocalProvider.query_metadata(&location).unwrap();
        Node::new(location, entry)
    }

    fn tree(root: &Path) {
        fs::create_dir_all(root.join("t/a/deep")).unwrap();
        fs::create_dir_all(root.join("t/b")).unwrap();
        fs::write(root.join("t/a/deep/1.txt"), "1").unwrap();
        fs::write(root.join("t/a/2.txt"), "2").unwrap();
        fs::write(root.join("t/3.txt"), "3").unwrap();
    }

    fn relative(root: &Path, operation: &Operation<LocalPath>) -> String {
        operation
            .to_string()
            .replace(&format!("{}/", root.display()), "")
    }

    #[test]
    fn delete_recursive_removes_children_before_parents() {
        let temp_dir = TempDir::new().unwrap();
        tree(temp_dir.path());
        let options = SyncOptions::default();
        let mut log: Vec<Operation<LocalPath>> = Vec::new();

        MutationExecutor::new(&LocalProvider, &options, &mut log)
            .delete_recursive(node(&temp_dir.path().join("t")))
            .unwrap();

        let lines: Vec<_> = log.iter().map(|op| relative(temp_dir.path(), op)).collect();
        assert_eq!(
            lines,
            vec![
                "X t/3.txt",
                "X t/a/2.txt",
                "X t/a/deep/1.txt",
                "X/ t/a/deep",
                "X/ t/a",
                "X/ t/b",
                "X/ t",
            ]
        );
        assert!(!temp_dir.path().join("t").exists());
    }

    #[test]
    fn dry_run_delete_only_logs() {
        let temp_dir = TempDir::new().unwrap();
        tree(temp_dir.path());
        let options = SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        };
        let mut log: Vec<Operation<LocalPath>> = Vec::new();

        let mut executor = MutationExecutor::new(&LocalProvider, &options, &mut log);
        executor
            .delete_recursive(node(&temp_dir.path().join("t")))
            .unwrap();
        assert_eq!(executor.operations(), 7);

        assert_eq!(log.len(), 7);
        assert!(temp_dir.path().join("t/a/deep/1.txt").exists());
    }

    #[test]
    fn create_directory_tolerates_existing() {
        let temp_dir = TempDir::new().unwrap();
        let options = SyncOptions::default();
        let mut log: Vec<Operation<LocalPath>> = Vec::new();
        let mut executor = MutationExecutor::new(&LocalProvider, &options, &mut log);

        let dir = local(&temp_dir.path().join("d"));
        executor.create_directory(&dir).unwrap();
        executor.create_directory(&dir).unwrap();

        assert!(temp_dir.path().join("d").is_dir());
    }

    #[test]
    fn create_directory_fails_without_parent() {
        let temp_dir = TempDir::new().unwrap();
        let options = SyncOptions::default();
        let mut log: Vec<Operation<LocalPath>> = Vec::new();
        let mut executor = MutationExecutor::new(&LocalProvider, &options, &mut log);

        let result = executor.create_directory(&local(&temp_dir.path().join("no/parent")));
        assert!(matches!(
            result,
            Err(MutationError::CreateDirectoryError { .. })
        ));
    }

    #[test]
    fn copy_file_without_overwrite_fails_on_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a"), "new").unwrap();
        fs::write(temp_dir.path().join("b"), "old").unwrap();
        let options = SyncOptions::default();
        let mut log: Vec<Operation<LocalPath>> = Vec::new();
        let mut executor = MutationExecutor::new(&LocalProvider, &options, &mut log);

        let source = local(&temp_dir.path().join("a"));
        let target = local(&temp_dir.path().join("b"));
        let result = executor.copy_file(&source, &target, false);
        assert!(matches!(result, Err(MutationError::CopyError { .. })));

        executor.copy_file(&source, &target, true).unwrap();
        assert_eq!(fs::read_to_string(temp_dir.path().join("b")).unwrap(), "new");
    }

    #[test]
    fn copy_directory_copies_files_and_queues_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        tree(temp_dir.path());
        let options = SyncOptions::default();
        let mut log: Vec<Operation<LocalPath>> = Vec::new();
        let mut executor = MutationExecutor::new(&LocalProvider, &options, &mut log);
        let mut work_list = WorkList::empty();

        let source = local(&temp_dir.path().join("t"));
        let destination = local(&temp_dir.path().join("copy"));
        let files = executor
            .copy_directory(&source, &destination, &[], &mut work_list)
            .unwrap();

        assert_eq!(files, 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("copy/3.txt")).unwrap(),
            "3"
        );
        assert_eq!(
            work_list.pop(),
            Some(Pending::Populate {
                source: local(&temp_dir.path().join("t/a")),
                destination: local(&temp_dir.path().join("copy/a")),
            })
        );
        assert_eq!(
            work_list.pop(),
            Some(Pending::Populate {
                source: local(&temp_dir.path().join("t/b")),
                destination: local(&temp_dir.path().join("copy/b")),
            })
        );
        assert!(work_list.is_empty());
    }
}
