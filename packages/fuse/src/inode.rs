//! Inode numbers for document paths.
//!
//! The document has no stable node identity: deleting an array element
//! renumbers its later siblings. A path is therefore the only identity, and
//! an inode is just a number handed out the first time a path is seen.

use std::collections::HashMap;

use jsonfs_json_store::Path;

/// The inode the kernel uses for the mount root.
pub const ROOT_INO: u64 = fuser::FUSE_ROOT_ID;

#[derive(Debug)]
pub struct InodeTable {
    paths: HashMap<u64, Path>,
    inodes: HashMap<Path, u64>,
    next: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = InodeTable {
            paths: HashMap::new(),
            inodes: HashMap::new(),
            next: ROOT_INO + 1,
        };
        table.paths.insert(ROOT_INO, Path::root());
        table.inodes.insert(Path::root(), ROOT_INO);
        table
    }

    pub fn path_of(&self, ino: u64) -> Option<&Path> {
        self.paths.get(&ino)
    }

    /// The inode for `path`, allocating one if the path is new.
    pub fn ino_for(&mut self, path: &Path) -> u64 {
        if let Some(&ino) = self.inodes.get(path) {
            return ino;
        }

        let ino = self.next;
        self.next += 1;
        self.paths.insert(ino, path.clone());
        self.inodes.insert(path.clone(), ino);
        ino
    }

    /// Drop `path` and everything below it. The root is never dropped.
    pub fn forget(&mut self, path: &Path) {
        self.drop_matching(|known| known.has_prefix(path));
    }

    /// Drop everything strictly below `path`, keeping `path` itself.
    pub fn forget_descendants(&mut self, path: &Path) {
        self.drop_matching(|known| known.len() > path.len() && known.has_prefix(path));
    }

    fn drop_matching(&mut self, matches: impl Fn(&Path) -> bool) {
        let doomed: Vec<Path> = self
            .inodes
            .keys()
            .filter(|known| !known.is_empty() && matches(known))
            .cloned()
            .collect();

        for known in doomed {
            if let Some(ino) = self.inodes.remove(&known) {
                self.paths.remove(&ino);
            }
        }
    }

    /// Re-key every path under `old` to sit under `new`, keeping inode
    /// numbers. Whatever was known under `new` is dropped first, since a
    /// rename overwrites its destination.
    pub fn rename_prefix(&mut self, old: &Path, new: &Path) {
        if old == new {
            return;
        }

        let moved: Vec<(Path, u64)> = self
            .inodes
            .iter()
            .filter(|(known, _)| known.has_prefix(old))
            .map(|(known, &ino)| (known.clone(), ino))
            .collect();

        self.forget(new);
        for (known, ino) in moved {
            self.inodes.remove(&known);
            self.paths.remove(&ino);

            // Renaming onto an ancestor detaches the source; nothing of it
            // survives under its old name.
            if old.has_prefix(new) {
                continue;
            }
            if let Some(rest) = known.strip_prefix(old) {
                let renamed = new.join(&rest);
                self.paths.insert(ino, renamed.clone());
                self.inodes.insert(renamed, ino);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
