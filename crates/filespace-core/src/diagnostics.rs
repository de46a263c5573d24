//! Anomalies found while decoding and collapsing tables.
//!
//! Collapsing is best-effort: every dangling reference skips the offending
//! row and is recorded here instead of aborting the pass.

use filespace_types::rows::Table;
use filespace_types::Id;
use serde::Serialize;

/// Why a row was left out of the tree, or how an ambiguity was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("{table} row {index} could not be decoded: {detail}")]
    MalformedRow {
        table: Table,
        index: usize,
        detail: String,
    },

    #[error("version {version} belongs to missing file {file}")]
    MissingFile { version: Id, file: Id },

    #[error("file {file} has missing current version {version}")]
    MissingCurrentVersion { file: Id, version: Id },

    #[error("file {file} names version {version} of file {owner} as current")]
    ForeignCurrentVersion { file: Id, version: Id, owner: Id },

    #[error("file {file} has missing parent folder {folder}")]
    MissingParentFolder { file: Id, folder: Id },

    #[error("folder {folder} has missing parent folder {parent}")]
    MissingFolderParent { folder: Id, parent: Id },

    #[error("version {version} references missing key {key}")]
    MissingKey { version: Id, key: Id },

    #[error("root folder {previous} replaced by later root candidate {replacement}")]
    ReplacedRoot { previous: Id, replacement: Id },
}

impl SkipReason {
    /// Whether the anomaly drops data from the tree, as opposed to only
    /// resolving an ambiguity.
    pub fn drops_data(&self) -> bool {
        !matches!(
            self,
            SkipReason::ReplacedRoot { .. } | SkipReason::ForeignCurrentVersion { .. }
        )
    }
}
