use std::io;
use std::path::{Component, Path, PathBuf};

/// Makes `path` absolute against the current directory and lexically normalizes it.
///
/// Unlike `canonicalize`, the path does not need to exist, which matters for
/// destinations that are about to be created. Symbolic links are left alone.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Ok(normalize_path(&absolute))
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

pub trait AbsolutePathExt {
    fn to_absolute(&self) -> io::Result<PathBuf>;
}

impl AbsolutePathExt for Path {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        absolute_path(self)
    }
}

impl AbsolutePathExt for PathBuf {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        absolute_path(self)
    }
}

impl AbsolutePathExt for &str {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        absolute_path(Path::new(self))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/a/b/../c", "/a/c")]
    #[case("/a/./b/", "/a/b")]
    #[case("/../a", "/a")]
    #[case("/a/b/../../..", "/")]
    fn normalize_resolves_dots(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = "some/dir/../file.txt".to_absolute().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("some/file.txt"));
    }

    #[test]
    fn absolute_paths_do_not_need_to_exist() {
        let path = PathBuf::from("/definitely/not/here/./x").to_absolute().unwrap();
        assert_eq!(path, PathBuf::from("/definitely/not/here/x"));
    }
}
