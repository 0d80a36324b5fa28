use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use derive_more::{AsRef, Deref, Display, From};
use snafu::{OptionExt, ensure};
use tracing::{debug, warn};

use crate::ext::AbsolutePathExt;
use crate::filesystem::provider::{InvalidLocationSnafu, UnsupportedKindSnafu};
use crate::filesystem::{Children, Entry, EntryKind, FilesystemProvider, Node, ProviderError};

const COPY_CHUNK_SIZE: usize = 64 * 1024;
const FILE_URI_PREFIX: &str = "file://";

/// An absolute, lexically normalized path on the local machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, AsRef, From)]
#[display("{}", _0.display())]
pub struct LocalPath(PathBuf);

/// Provider over any locally mounted filesystem, including FUSE and GVFS mounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl LocalProvider {
    fn path_from_uri(argument: &str) -> Result<PathBuf, ProviderError> {
        let rest = &argument[FILE_URI_PREFIX.len()..];
        let (host, path) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };
        ensure!(
            host.is_empty() || host == "localhost",
            InvalidLocationSnafu {
                argument,
                reason: format!("host '{host}' is not local"),
            }
        );
        ensure!(
            !path.is_empty(),
            InvalidLocationSnafu {
                argument,
                reason: "URI has no path",
            }
        );

        let decoded = urlencoding::decode(path).map_err(|err| ProviderError::InvalidLocation {
            argument: argument.to_string(),
            reason: err.to_string(),
        })?;
        Ok(PathBuf::from(decoded.into_owned()))
    }

    fn entry_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// Regular files and directories only. Pipes, sockets and device nodes yield `None`.
    fn entry_from_metadata(name: String, metadata: &fs::Metadata) -> Option<Entry> {
        let file_type = metadata.file_type();
        let (kind, size) = if file_type.is_dir() {
            (EntryKind::Directory, 0)
        } else if file_type.is_file() {
            (EntryKind::File, metadata.len())
        } else {
            return None;
        };
        Some(Entry {
            name,
            kind,
            size,
            modified_at: metadata.modified().ok(),
        })
    }

    fn copy_contents(
        source: &LocalPath,
        destination: &LocalPath,
        overwrite: bool,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), ProviderError> {
        let mut reader =
            File::open(source.as_path()).map_err(|e| ProviderError::from_io(source, e))?;
        let total = reader
            .metadata()
            .map_err(|e| ProviderError::from_io(source, e))?
            .len();

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut writer = options
            .open(destination.as_path())
            .map_err(|e| ProviderError::from_io(destination, e))?;

        let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
        let mut transferred = 0u64;
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| ProviderError::from_io(source, e))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .map_err(|e| ProviderError::from_io(destination, e))?;
            transferred += read as u64;
            on_progress(transferred, total.max(transferred));
        }
        writer
            .flush()
            .map_err(|e| ProviderError::from_io(destination, e))?;

        if transferred == 0 {
            on_progress(0, 0);
        }

        Ok(())
    }
}

impl FilesystemProvider for LocalProvider {
    type Location = LocalPath;

    fn resolve(&self, argument: &str) -> Result<LocalPath, ProviderError> {
        let path = if argument.starts_with(FILE_URI_PREFIX) {
            Self::path_from_uri(argument)?
        } else if let Some((scheme, _)) = argument.split_once("://") {
            return InvalidLocationSnafu {
                argument,
                reason: format!("unsupported scheme '{scheme}'"),
            }
            .fail();
        } else {
            PathBuf::from(argument)
        };

        let absolute = path
            .to_absolute()
            .map_err(|e| ProviderError::from_io(argument, e))?;
        debug!("Resolved '{}' to {}", argument, absolute.display());
        Ok(LocalPath(absolute))
    }

    fn query_metadata(&self, location: &LocalPath) -> Result<Entry, ProviderError> {
        let metadata = fs::metadata(location.as_path())
            .map_err(|e| ProviderError::from_io(location, e))?;
        Self::entry_from_metadata(Self::entry_name(location), &metadata).context(
            UnsupportedKindSnafu {
                location: location.to_string(),
            },
        )
    }

    fn enumerate_children(
        &self,
        location: &LocalPath,
        exclude: &[LocalPath],
    ) -> Result<Children<LocalPath>, ProviderError> {
        let mut children = Children::default();

        let read_dir =
            fs::read_dir(location.as_path()).map_err(|e| ProviderError::from_io(location, e))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| ProviderError::from_io(location, e))?;
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(
                    "Skipping {}: name is not valid UTF-8",
                    dir_entry.path().display()
                );
                continue;
            };
            let child = self.child_location(location, name);

            if exclude.iter().any(|excluded| self.locations_equal(excluded, &child)) {
                debug!("Excluding {} from listing", child);
                continue;
            }

            // DirEntry::metadata does not traverse symbolic links
            let metadata = dir_entry
                .metadata()
                .map_err(|e| ProviderError::from_io(&child, e))?;
            if metadata.file_type().is_symlink() {
                warn!("Skipping symbolic link {}", child);
                continue;
            }

            let Some(entry) = Self::entry_from_metadata(name.to_string(), &metadata) else {
                warn!("Skipping {}: not a regular file or directory", child);
                continue;
            };
            children.push(Node::new(child, entry));
        }

        Ok(children)
    }

    fn copy(
        &self,
        source: &LocalPath,
        destination: &LocalPath,
        overwrite: bool,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<(), ProviderError> {
        Self::copy_contents(source, destination, overwrite, on_progress)
    }

    fn delete(&self, location: &LocalPath) -> Result<(), ProviderError> {
        let metadata = fs::symlink_metadata(location.as_path())
            .map_err(|e| ProviderError::from_io(location, e))?;
        let result = if metadata.is_dir() {
            fs::remove_dir(location.as_path())
        } else {
            fs::remove_file(location.as_path())
        };
        result.map_err(|e| ProviderError::from_io(location, e))
    }

    fn make_directory(&self, location: &LocalPath) -> Result<(), ProviderError> {
        fs::create_dir(location.as_path()).map_err(|e| ProviderError::from_io(location, e))
    }

    fn locations_equal(&self, a: &LocalPath, b: &LocalPath) -> bool {
        a == b
    }

    fn child_location(&self, parent: &LocalPath, name: &str) -> LocalPath {
        LocalPath(parent.join(name))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn local(path: &Path) -> LocalPath {
        LocalProvider.resolve(path.to_str().unwrap()).unwrap()
    }

    #[rstest]
    #[case("file:///tmp/a%20b.txt", "/tmp/a b.txt")]
    #[case("file://localhost/var/data", "/var/data")]
    #[case("/tmp/x/../y", "/tmp/y")]
    fn resolve_accepts_paths_and_file_uris(#[case] argument: &str, #[case] expected: &str) {
        let location = LocalProvider.resolve(argument).unwrap();
        assert_eq!(location.as_path(), Path::new(expected));
    }

    #[rstest]
    #[case("mtp://phone/Internal storage")]
    #[case("file://remote-host/tmp")]
    #[case("file://")]
    fn resolve_rejects_non_local_uris(#[case] argument: &str) {
        let result = LocalProvider.resolve(argument);
        assert!(matches!(
            result,
            Err(ProviderError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn query_metadata_reports_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = local(&temp_dir.path().join("missing.txt"));

        let error = LocalProvider.query_metadata(&missing).unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn query_metadata_describes_files_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();

        let file = LocalProvider
            .query_metadata(&local(&temp_dir.path().join("a.txt")))
            .unwrap();
        assert_eq!(file.name, "a.txt");
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 5);
        assert!(file.modified_at.is_some());

        let dir = LocalProvider.query_metadata(&local(temp_dir.path())).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn enumerate_children_splits_and_excludes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("f.txt"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::create_dir(temp_dir.path().join("out")).unwrap();

        let root = local(temp_dir.path());
        let excluded = LocalProvider.child_location(&root, "out");
        let children = LocalProvider.enumerate_children(&root, &[excluded]).unwrap();

        assert_eq!(children.files.len(), 1);
        assert_eq!(children.files[0].name(), "f.txt");
        assert_eq!(children.dirs.len(), 1);
        assert_eq!(children.dirs[0].name(), "sub");
    }

    #[cfg(unix)]
    #[test]
    fn enumerate_children_skips_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("real.txt"),
            temp_dir.path().join("link.txt"),
        )
        .unwrap();

        let children = LocalProvider
            .enumerate_children(&local(temp_dir.path()), &[])
            .unwrap();
        let names: Vec<_> = children.files.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["real.txt"]);
    }

    #[cfg(unix)]
    fn make_fifo(path: &Path) {
        let status = std::process::Command::new("mkfifo")
            .arg(path)
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn enumerate_children_skips_special_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("real.txt"), "x").unwrap();
        make_fifo(&temp_dir.path().join("pipe"));
        let _socket =
            std::os::unix::net::UnixListener::bind(temp_dir.path().join("socket")).unwrap();

        let children = LocalProvider
            .enumerate_children(&local(temp_dir.path()), &[])
            .unwrap();
        let names: Vec<_> = children.files.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["real.txt"]);
        assert!(children.dirs.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn query_metadata_rejects_special_files() {
        let temp_dir = TempDir::new().unwrap();
        let pipe = temp_dir.path().join("pipe");
        make_fifo(&pipe);

        let error = LocalProvider.query_metadata(&local(&pipe)).unwrap_err();
        assert!(matches!(error, ProviderError::UnsupportedKind { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn enumerate_children_skips_names_that_are_not_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("ok.txt"), "x").unwrap();
        fs::write(temp_dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "x").unwrap();

        let children = LocalProvider
            .enumerate_children(&local(temp_dir.path()), &[])
            .unwrap();
        let names: Vec<_> = children.files.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["ok.txt"]);
    }

    #[test]
    fn make_directory_reports_already_exists() {
        let temp_dir = TempDir::new().unwrap();
        let dir = local(&temp_dir.path().join("d"));

        LocalProvider.make_directory(&dir).unwrap();
        let error = LocalProvider.make_directory(&dir).unwrap_err();
        assert!(error.is_already_exists());
    }

    #[test]
    fn copy_reports_progress_and_respects_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let content = "y".repeat(COPY_CHUNK_SIZE * 2 + 10);
        fs::write(temp_dir.path().join("src.bin"), &content).unwrap();
        fs::write(temp_dir.path().join("dst.bin"), "old").unwrap();

        let source = local(&temp_dir.path().join("src.bin"));
        let destination = local(&temp_dir.path().join("dst.bin"));

        let error = LocalProvider
            .copy(&source, &destination, false, &mut |_, _| {})
            .unwrap_err();
        assert!(error.is_already_exists());

        let mut updates = Vec::new();
        LocalProvider
            .copy(&source, &destination, true, &mut |done, total| {
                updates.push((done, total))
            })
            .unwrap();

        assert!(updates.len() >= 3);
        assert_eq!(
            updates.last(),
            Some(&(content.len() as u64, content.len() as u64))
        );
        assert_eq!(fs::read_to_string(destination.as_path()).unwrap(), content);
    }

    #[test]
    fn delete_removes_files_and_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("d")).unwrap();
        fs::write(temp_dir.path().join("f"), "").unwrap();

        LocalProvider.delete(&local(&temp_dir.path().join("f"))).unwrap();
        LocalProvider.delete(&local(&temp_dir.path().join("d"))).unwrap();

        assert!(!temp_dir.path().join("f").exists());
        assert!(!temp_dir.path().join("d").exists());
    }
}
