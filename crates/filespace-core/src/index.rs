//! Id-keyed lookup maps built from a [`TableSet`].
//!
//! Folders, files and versions are turned into tree nodes with empty derived
//! collections (child lists, version lists, likes) so the collapser only has
//! to link them. A repeated id keeps the later row.

use std::collections::HashMap;

use filespace_types::rows::Key;
use filespace_types::tree::{File, Folder, Version};
use filespace_types::Id;

use crate::tables::TableSet;

/// Lookup maps for one account's filespace.
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub folders: HashMap<Id, Folder>,
    pub files: HashMap<Id, File>,
    pub versions: HashMap<Id, Version>,
    pub keys: HashMap<Id, Key>,
}

/// Index `tables`, stamping every folder with `owner`.
pub fn build(tables: &TableSet, owner: &str) -> Index {
    let folders = tables
        .folders
        .iter()
        .map(|row| {
            (
                row.id,
                Folder::new(row.id, row.name.clone(), owner, row.parent_folder),
            )
        })
        .collect();

    let files = tables
        .files
        .iter()
        .map(|row| {
            (
                row.id,
                File {
                    id: row.id,
                    name: row.name.clone(),
                    parent_id: row.parent_folder,
                    current_version: None,
                    versions: Vec::new(),
                },
            )
        })
        .collect();

    let versions = tables
        .versions
        .iter()
        .map(|row| {
            (
                row.id,
                Version {
                    id: row.id,
                    file: row.file,
                    ipfs_hash: row.ipfs_hash.clone(),
                    sha256: row.sha256.clone(),
                    date: row.date,
                    key_id: row.key,
                    key: None,
                    grant: None,
                    likes: Vec::new(),
                },
            )
        })
        .collect();

    let keys = tables.keys.iter().map(|key| (key.id, key.clone())).collect();

    Index {
        folders,
        files,
        versions,
        keys,
    }
}
