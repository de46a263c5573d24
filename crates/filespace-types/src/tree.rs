//! The collapsed filespace tree.
//!
//! Parents own their children by value. Nodes carry their parent's id for
//! display, but never a link back to it: callers that need a node's parent
//! look it up from the root (`parent_of_folder_mut`, `parent_of_file_mut`).

use serde::{Deserialize, Serialize};

use crate::rows::{EncryptedKeyGrant, Key};
use crate::Id;

/// A folder and everything below it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Folder {
    pub id: Id,
    pub name: String,
    /// Account whose filespace this folder belongs to.
    pub owner: String,
    /// `None` for the root folder.
    pub parent_id: Option<Id>,
    pub child_folders: Vec<Folder>,
    pub child_files: Vec<File>,
}

/// A file: an ordered list of versions, one of which is current.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct File {
    pub id: Id,
    pub name: String,
    pub parent_id: Id,
    /// Resolved current version; always the id of an entry in `versions`.
    /// A current version owned by another file is attached to `versions` as a
    /// copy.
    pub current_version: Option<Id>,
    pub versions: Vec<Version>,
}

/// One stored revision of a file's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Version {
    pub id: Id,
    pub file: Id,
    pub ipfs_hash: String,
    pub sha256: String,
    pub date: u64,
    /// Referenced key, if the content is encrypted.
    pub key_id: Option<Id>,
    /// Resolved key; only set when `grant` is set.
    pub key: Option<Key>,
    /// The wrapped key visible to the viewer.
    pub grant: Option<EncryptedKeyGrant>,
    /// Accounts that liked this version.
    pub likes: Vec<String>,
}

/// An account's profile picture and its key material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Profile {
    pub account: String,
    pub ipfs_hash: String,
    pub key_id: Option<Id>,
    pub key: Option<Key>,
    pub grant: Option<EncryptedKeyGrant>,
}

impl Folder {
    /// An empty folder.
    pub fn new(id: Id, name: impl Into<String>, owner: impl Into<String>, parent_id: Option<Id>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: owner.into(),
            parent_id,
            child_folders: Vec::new(),
            child_files: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Folders of this subtree in depth-first pre-order, starting at `self`.
    ///
    /// Walks with an explicit stack, so depth is bounded by the heap rather
    /// than the call stack.
    pub fn folders(&self) -> impl Iterator<Item = &Folder> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let folder = stack.pop()?;
            stack.extend(folder.child_folders.iter().rev());
            Some(folder)
        })
    }

    /// Find a folder by id in this subtree, including `self`.
    pub fn find_folder(&self, id: Id) -> Option<&Folder> {
        self.folders().find(|folder| folder.id == id)
    }

    pub fn find_folder_mut(&mut self, id: Id) -> Option<&mut Folder> {
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            if folder.id == id {
                return Some(folder);
            }
            stack.extend(folder.child_folders.iter_mut().rev());
        }
        None
    }

    /// Find a listed file by id in this subtree.
    pub fn find_file(&self, id: Id) -> Option<&File> {
        self.folders()
            .flat_map(|folder| folder.child_files.iter())
            .find(|file| file.id == id)
    }

    /// Find a version of any listed file in this subtree.
    pub fn find_version_mut(&mut self, id: Id) -> Option<&mut Version> {
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            let Folder {
                child_folders,
                child_files,
                ..
            } = folder;
            let found = child_files
                .iter_mut()
                .flat_map(|file| file.versions.iter_mut())
                .find(|version| version.id == id);
            if found.is_some() {
                return found;
            }
            stack.extend(child_folders.iter_mut().rev());
        }
        None
    }

    /// The folder whose child-folder list contains `id`.
    pub fn parent_of_folder_mut(&mut self, id: Id) -> Option<&mut Folder> {
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            if folder.child_folders.iter().any(|child| child.id == id) {
                return Some(folder);
            }
            stack.extend(folder.child_folders.iter_mut().rev());
        }
        None
    }

    /// The folder whose child-file list contains `id`.
    pub fn parent_of_file_mut(&mut self, id: Id) -> Option<&mut Folder> {
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            if folder.child_files.iter().any(|file| file.id == id) {
                return Some(folder);
            }
            stack.extend(folder.child_folders.iter_mut().rev());
        }
        None
    }

    /// Detach a direct child folder.
    pub fn remove_child_folder(&mut self, id: Id) -> Option<Folder> {
        let index = self.child_folders.iter().position(|child| child.id == id)?;
        Some(self.child_folders.remove(index))
    }

    /// Detach a direct child file.
    pub fn remove_child_file(&mut self, id: Id) -> Option<File> {
        let index = self.child_files.iter().position(|file| file.id == id)?;
        Some(self.child_files.remove(index))
    }

    /// Whether any version of any listed file in this subtree is stored at
    /// `ipfs_hash`.
    pub fn contains_hash(&self, ipfs_hash: &str) -> bool {
        self.folders()
            .flat_map(|folder| folder.child_files.iter())
            .flat_map(|file| file.versions.iter())
            .any(|version| version.ipfs_hash == ipfs_hash)
    }
}

impl File {
    pub fn current_version(&self) -> Option<&Version> {
        let id = self.current_version?;
        self.versions.iter().find(|version| version.id == id)
    }
}

impl Version {
    /// Whether the content is encrypted but the viewer holds no grant for it.
    pub fn is_locked(&self) -> bool {
        self.key_id.is_some() && self.grant.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(id: Id, file: Id, hash: &str) -> Version {
        Version {
            id,
            file,
            ipfs_hash: hash.to_string(),
            sha256: String::new(),
            date: 0,
            key_id: None,
            key: None,
            grant: None,
            likes: Vec::new(),
        }
    }

    fn sample() -> Folder {
        let mut root = Folder::new(1, "root", "alice", None);
        let mut docs = Folder::new(2, "docs", "alice", Some(1));
        docs.child_files.push(File {
            id: 10,
            name: "a.txt".to_string(),
            parent_id: 2,
            current_version: Some(100),
            versions: vec![version(100, 10, "QmA"), version(101, 10, "QmB")],
        });
        root.child_folders.push(docs);
        root.child_folders.push(Folder::new(3, "music", "alice", Some(1)));
        root
    }

    #[test]
    fn test_find_nested_nodes() {
        let mut root = sample();
        assert_eq!(root.find_folder(3).map(|f| f.name.as_str()), Some("music"));
        assert_eq!(root.find_file(10).map(|f| f.versions.len()), Some(2));
        assert!(root.find_version_mut(101).is_some());
        assert!(root.find_folder(99).is_none());
    }

    #[test]
    fn test_parent_lookup() {
        let mut root = sample();
        assert_eq!(root.parent_of_folder_mut(2).map(|f| f.id), Some(1));
        assert_eq!(root.parent_of_file_mut(10).map(|f| f.id), Some(2));
        assert!(root.parent_of_folder_mut(1).is_none());
    }

    #[test]
    fn test_remove_children() {
        let mut root = sample();
        let removed = root.remove_child_folder(3).expect("remove folder");
        assert_eq!(removed.name, "music");
        assert_eq!(root.child_folders.len(), 1);
        assert!(root.remove_child_folder(3).is_none());

        let docs = root.find_folder_mut(2).expect("docs");
        assert!(docs.remove_child_file(10).is_some());
        assert!(docs.child_files.is_empty());
    }

    #[test]
    fn test_contains_hash_searches_all_versions() {
        let root = sample();
        assert!(root.contains_hash("QmA"));
        assert!(root.contains_hash("QmB"));
        assert!(!root.contains_hash("QmC"));
    }

    #[test]
    fn test_current_version() {
        let root = sample();
        let file = root.find_file(10).expect("file");
        assert_eq!(file.current_version().map(|v| v.id), Some(100));
    }

    #[test]
    fn test_deep_chain_lookups() {
        let depth: Id = 2_000;
        let mut folder = Folder::new(depth, "leaf", "alice", Some(depth - 1));
        folder.child_files.push(File {
            id: 10,
            name: "deep.txt".to_string(),
            parent_id: depth,
            current_version: Some(100),
            versions: vec![version(100, 10, "QmDeep")],
        });
        for id in (1..depth).rev() {
            let mut parent = Folder::new(id, "level", "alice", (id > 1).then_some(id - 1));
            parent.child_folders.push(folder);
            folder = parent;
        }
        let mut root = folder;

        assert_eq!(root.folders().count(), depth as usize);
        assert_eq!(root.find_folder(depth).map(|f| f.name.as_str()), Some("leaf"));
        assert!(root.find_file(10).is_some());
        assert!(root.contains_hash("QmDeep"));
        assert!(root.find_version_mut(100).is_some());
        assert_eq!(root.parent_of_file_mut(10).map(|f| f.id), Some(depth));
        assert_eq!(root.parent_of_folder_mut(depth).map(|f| f.id), Some(depth - 1));
        assert!(root.find_folder_mut(depth / 2).is_some());
    }

    #[test]
    fn test_folders_walk_in_pre_order() {
        let root = sample();
        let ids: Vec<Id> = root.folders().map(|folder| folder.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
