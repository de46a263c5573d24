//! Graph collapsing: linking indexed rows into one rooted tree.
//!
//! Links are recorded as id lists in row order first, then the tree is
//! materialized from the root down. Each node is moved out of its map when
//! it is placed, so a folder reachable twice (or through a parent cycle) is
//! placed at most once.

use std::collections::{HashMap, HashSet};

use filespace_types::rows::EncryptedKeyGrant;
use filespace_types::tree::{File, Folder, Version};
use filespace_types::Id;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::diagnostics::SkipReason;
use crate::index::{self, Index};
use crate::tables::TableSet;

/// The result of one collapsing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collapsed {
    /// `None` when the account has no parentless folder yet.
    pub root: Option<Folder>,
    pub diagnostics: Vec<SkipReason>,
}

/// The first grant, in row order, that wraps `key_id` for `viewer_public_key`.
pub fn visible_grant<'a>(
    grants: &'a [EncryptedKeyGrant],
    key_id: Id,
    viewer_public_key: &str,
) -> Option<&'a EncryptedKeyGrant> {
    grants
        .iter()
        .find(|grant| grant.unlocks(key_id, viewer_public_key))
}

/// Index and collapse `owner`'s tables as seen by `viewer_public_key`.
pub fn collapse_tables(tables: &TableSet, owner: &str, viewer_public_key: &str) -> Collapsed {
    collapse(index::build(tables, owner), tables, owner, viewer_public_key)
}

/// Collapse an index into a tree.
///
/// `tables` supplies row order and the raw likes and grants. Dangling
/// references are logged, recorded in [`Collapsed::diagnostics`], and the
/// offending row is skipped; the pass never aborts.
pub fn collapse(index: Index, tables: &TableSet, owner: &str, viewer_public_key: &str) -> Collapsed {
    let Index {
        folders,
        mut files,
        mut versions,
        keys,
    } = index;
    let mut diagnostics = Vec::new();
    let mut links = Links::default();

    // Versions join their file's version list.
    for row in &tables.versions {
        if files.contains_key(&row.file) {
            links.file_versions.entry(row.file).or_default().push(row.id);
        } else {
            error!(version = row.id, file = row.file, "Version has missing file");
            diagnostics.push(SkipReason::MissingFile {
                version: row.id,
                file: row.file,
            });
        }
    }

    // Files with a current version join their folder; the current version's
    // key is resolved for the viewer. A current version owned by another
    // file is still honoured and reported.
    let mut resolved = HashSet::new();
    for row in &tables.files {
        let Some(version_id) = row.current_version else {
            continue;
        };
        let Some(version) = versions.get_mut(&version_id) else {
            error!(file = row.id, version = version_id, "File has missing current version");
            diagnostics.push(SkipReason::MissingCurrentVersion {
                file: row.id,
                version: version_id,
            });
            continue;
        };
        if version.file != row.id {
            warn!(
                file = row.id,
                version = version_id,
                owner = version.file,
                "Current version belongs to another file"
            );
            diagnostics.push(SkipReason::ForeignCurrentVersion {
                file: row.id,
                version: version_id,
                owner: version.file,
            });
        }
        if !folders.contains_key(&row.parent_folder) {
            error!(file = row.id, folder = row.parent_folder, "File has missing parent folder");
            diagnostics.push(SkipReason::MissingParentFolder {
                file: row.id,
                folder: row.parent_folder,
            });
            continue;
        }

        if let Some(file) = files.get_mut(&row.id) {
            file.current_version = Some(version_id);
        }
        links
            .folder_files
            .entry(row.parent_folder)
            .or_default()
            .push(row.id);
        if version.file != row.id {
            links.borrowed_versions.insert(row.id, version_id);
        }

        if let Some(key_id) = version.key_id {
            if resolved.insert(version_id) {
                resolve_key(version, key_id, &keys, &tables.grants, viewer_public_key, &mut diagnostics);
            }
        }
    }

    // Folders join their parent; a parentless folder is the root.
    let mut root_id: Option<Id> = None;
    for row in &tables.folders {
        match row.parent_folder {
            Some(parent) if folders.contains_key(&parent) => {
                links.folder_children.entry(parent).or_default().push(row.id);
            }
            Some(parent) => {
                error!(folder = row.id, parent, "Folder has missing parent folder");
                diagnostics.push(SkipReason::MissingFolderParent {
                    folder: row.id,
                    parent,
                });
            }
            None => {
                if let Some(previous) = root_id.replace(row.id) {
                    warn!(previous, replacement = row.id, "Multiple root folders, keeping the last");
                    diagnostics.push(SkipReason::ReplacedRoot {
                        previous,
                        replacement: row.id,
                    });
                }
            }
        }
    }

    // Likes count only toward the owner's versions.
    for like in tables.likes.iter().filter(|like| like.liked == owner) {
        match versions.get_mut(&like.version) {
            Some(version) => version.likes.push(like.liker.clone()),
            None => trace!(like = like.id, version = like.version, "Like targets a deleted version"),
        }
    }

    // Borrowed versions are copied once fully decorated, before their owner
    // takes the original.
    let borrowed = links
        .borrowed_versions
        .iter()
        .filter_map(|(&file_id, version_id)| Some((file_id, versions.get(version_id)?.clone())))
        .collect();

    let mut nodes = Nodes {
        folders,
        files,
        versions,
        borrowed,
        links,
    };
    let root = root_id.and_then(|id| nodes.folder(id));

    debug!(
        owner,
        found_root = root.is_some(),
        anomalies = diagnostics.len(),
        "Collapsed filespace"
    );

    Collapsed { root, diagnostics }
}

fn resolve_key(
    version: &mut Version,
    key_id: Id,
    keys: &HashMap<Id, filespace_types::rows::Key>,
    grants: &[EncryptedKeyGrant],
    viewer_public_key: &str,
    diagnostics: &mut Vec<SkipReason>,
) {
    let Some(grant) = visible_grant(grants, key_id, viewer_public_key) else {
        trace!(version = version.id, key = key_id, "No grant visible to viewer");
        return;
    };
    version.grant = Some(grant.clone());
    match keys.get(&key_id) {
        Some(key) => version.key = Some(key.clone()),
        None => {
            error!(version = version.id, key = key_id, "Version references missing key");
            diagnostics.push(SkipReason::MissingKey {
                version: version.id,
                key: key_id,
            });
        }
    }
}

/// Child id lists, in row order.
#[derive(Default)]
struct Links {
    folder_children: HashMap<Id, Vec<Id>>,
    folder_files: HashMap<Id, Vec<Id>>,
    file_versions: HashMap<Id, Vec<Id>>,
    /// File id to the id of its current version owned by another file.
    borrowed_versions: HashMap<Id, Id>,
}

struct Nodes {
    folders: HashMap<Id, Folder>,
    files: HashMap<Id, File>,
    versions: HashMap<Id, Version>,
    borrowed: HashMap<Id, Version>,
    links: Links,
}

impl Nodes {
    /// Materialize the subtree under `root_id`.
    ///
    /// Folders are taken in depth-first pre-order with an explicit stack,
    /// each remembering the position of its parent, then assembled in reverse
    /// so every folder is complete before it is attached.
    fn folder(&mut self, root_id: Id) -> Option<Folder> {
        let mut placed: Vec<(Folder, Option<usize>)> = Vec::new();
        let mut stack = vec![(root_id, None)];
        while let Some((id, parent)) = stack.pop() {
            let Some(folder) = self.folders.remove(&id) else {
                continue;
            };
            let position = placed.len();
            let children = self.links.folder_children.remove(&id).unwrap_or_default();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(position))));
            placed.push((folder, parent));
        }

        let mut files: Vec<Vec<File>> = Vec::with_capacity(placed.len());
        for (folder, _) in &placed {
            let file_ids = self.links.folder_files.remove(&folder.id).unwrap_or_default();
            files.push(file_ids.into_iter().filter_map(|file_id| self.file(file_id)).collect());
        }

        let mut children: Vec<Vec<Folder>> = placed.iter().map(|_| Vec::new()).collect();
        let mut root = None;
        while let Some((mut folder, parent)) = placed.pop() {
            if let Some(mut child_folders) = children.pop() {
                // Siblings arrive last first.
                child_folders.reverse();
                folder.child_folders = child_folders;
            }
            folder.child_files = files.pop().unwrap_or_default();
            match parent.and_then(|p| children.get_mut(p)) {
                Some(siblings) => siblings.push(folder),
                None => root = Some(folder),
            }
        }
        root
    }

    fn file(&mut self, id: Id) -> Option<File> {
        let mut file = self.files.remove(&id)?;
        let version_ids = self.links.file_versions.remove(&id).unwrap_or_default();
        file.versions = version_ids
            .into_iter()
            .filter_map(|version_id| self.versions.remove(&version_id))
            .collect();
        if let Some(version) = self.borrowed.remove(&id) {
            file.versions.push(version);
        }
        Some(file)
    }
}
