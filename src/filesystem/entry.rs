use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata snapshot of a single filesystem node, as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified_at: Option<SystemTime>,
}

impl Entry {
    #[cfg(test)]
    pub fn file(name: impl Into<String>, size: u64, modified_at: Option<SystemTime>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            modified_at,
        }
    }

    #[cfg(test)]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified_at: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// An entry together with the location it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<L> {
    pub location: L,
    pub entry: Entry,
}

impl<L> Node<L> {
    pub fn new(location: L, entry: Entry) -> Self {
        Self { location, entry }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }
}

/// Children of one directory, split by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Children<L> {
    pub files: Vec<Node<L>>,
    pub dirs: Vec<Node<L>>,
}

impl<L> Default for Children<L> {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }
}

impl<L> Children<L> {
    /// Listing of a lone file, used when a file is treated as a directory holding only itself.
    pub fn single_file(node: Node<L>) -> Self {
        Self {
            files: vec![node],
            dirs: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node<L>) {
        if node.entry.is_dir() {
            self.dirs.push(node);
        } else {
            self.files.push(node);
        }
    }

    pub fn into_nodes(self) -> Vec<Node<L>> {
        let mut nodes = self.files;
        nodes.extend(self.dirs);
        nodes
    }
}
