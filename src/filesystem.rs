//! Flat, in-memory snapshot of a git tree for path manipulation

use std::collections::BTreeMap;

use git2::Oid;

use crate::error::{Error, Result};
use crate::git::{ObjectStore, TreeItem, MODE_TREE};
use crate::path::validate_tree_path;

/// A non-directory entry: blob, symlink or submodule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// File mode as stored in the tree (e.g. 0o100644)
    pub mode: i32,
    /// Object the entry points to
    pub id: Oid,
}

/// All files of a tree keyed by their full `/`-separated path.
///
/// Paths are kept sorted so that iteration, and therefore every tree written
/// from a snapshot, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    files: BTreeMap<String, Entry>,
}

impl TreeSnapshot {
    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten the tree `id` from `store`.
    pub fn load(store: &dyn ObjectStore, id: Oid) -> Result<Self> {
        let mut snapshot = Self::new();
        let mut pending = vec![(String::new(), id)];

        while let Some((prefix, tree)) = pending.pop() {
            for item in store.read_tree(tree)? {
                let is_tree = item.is_tree();
                let path = if prefix.is_empty() {
                    item.name
                } else {
                    format!("{prefix}/{}", item.name)
                };

                if is_tree {
                    pending.push((path, item.id));
                } else {
                    snapshot.files.insert(
                        path,
                        Entry {
                            mode: item.mode,
                            id: item.id,
                        },
                    );
                }
            }
        }

        Ok(snapshot)
    }

    /// Add a file, failing if the path is already taken
    pub fn insert(&mut self, path: String, entry: Entry) -> Result<()> {
        if let Some(problem) = validate_tree_path(&path) {
            return Err(Error::Rewrite {
                commit: String::new(),
                message: problem,
            });
        }
        if self.files.contains_key(&path) {
            return Err(Error::Rewrite {
                commit: String::new(),
                message: format!("path collision at '{path}'"),
            });
        }
        self.files.insert(path, entry);
        Ok(())
    }

    /// Get a file by path
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.files.get(path)
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterate over all files in path order
    pub fn files(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.files.iter()
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write the snapshot as nested trees into `store`, returning the root.
    ///
    /// Fails when a path is used both as a file and as a directory.
    pub fn write(&self, store: &dyn ObjectStore) -> Result<Oid> {
        let mut root = Dir::default();
        for (path, entry) in &self.files {
            root.insert(path, *entry)?;
        }
        root.write(store)
    }
}

#[derive(Debug, Default)]
struct Dir {
    children: BTreeMap<String, Node>,
}

#[derive(Debug)]
enum Node {
    File(Entry),
    Dir(Dir),
}

impl Dir {
    fn insert(&mut self, path: &str, entry: Entry) -> Result<()> {
        let collision = || Error::Rewrite {
            commit: String::new(),
            message: format!("'{path}' collides with another entry used as file and directory"),
        };

        let mut dir = self;
        let mut components = path.split('/').peekable();

        while let Some(name) = components.next() {
            if components.peek().is_none() {
                if dir.children.contains_key(name) {
                    return Err(collision());
                }
                dir.children.insert(name.to_string(), Node::File(entry));
                return Ok(());
            }

            let node = dir
                .children
                .entry(name.to_string())
                .or_insert_with(|| Node::Dir(Dir::default()));
            dir = match node {
                Node::Dir(child) => child,
                Node::File(_) => return Err(collision()),
            };
        }

        Ok(())
    }

    fn write(&self, store: &dyn ObjectStore) -> Result<Oid> {
        let mut items = Vec::with_capacity(self.children.len());
        for (name, node) in &self.children {
            let (mode, id) = match node {
                Node::File(entry) => (entry.mode, entry.id),
                Node::Dir(dir) => (MODE_TREE, dir.write(store)?),
            };
            items.push(TreeItem {
                name: name.clone(),
                mode,
                id,
            });
        }
        store.write_tree(&items)
    }
}
