//! Typed ledger rows, one struct per table kind.
//!
//! Field names match the ledger contract's table schema. Reference fields that
//! use `0` for "none" decode to `Option<Id>`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ref_id, Id};

/// The tables exposed by the filespace contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Folders,
    Files,
    Versions,
    Likes,
    Keys,
    #[serde(rename = "enckeys")]
    EncKeys,
    Profiles,
    Posts,
}

impl Table {
    /// Table name on the ledger.
    pub fn name(self) -> &'static str {
        match self {
            Table::Folders => "folders",
            Table::Files => "files",
            Table::Versions => "versions",
            Table::Likes => "likes",
            Table::Keys => "keys",
            Table::EncKeys => "enckeys",
            Table::Profiles => "profiles",
            Table::Posts => "posts",
        }
    }

    /// Whether the table lives in the contract's own scope rather than in
    /// each account's scope.
    pub fn is_contract_scoped(self) -> bool {
        matches!(self, Table::Likes | Table::Posts)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `folders` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRow {
    pub id: Id,
    pub name: String,
    /// `None` marks the root folder.
    #[serde(default, with = "ref_id")]
    pub parent_folder: Option<Id>,
}

/// `files` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRow {
    pub id: Id,
    pub name: String,
    pub parent_folder: Id,
    #[serde(default, with = "ref_id")]
    pub current_version: Option<Id>,
}

/// `versions` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    pub id: Id,
    pub file: Id,
    /// Content address of the stored bytes.
    pub ipfs_hash: String,
    pub sha256: String,
    pub date: u64,
    /// `None` for unencrypted content.
    #[serde(default, with = "ref_id")]
    pub key: Option<Id>,
}

/// `likes` row. Stored in the contract scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRow {
    pub id: Id,
    pub liker: String,
    /// Account whose filespace holds the liked version.
    pub liked: String,
    pub version: Id,
}

/// `keys` row: a symmetric content key, identified only by its IV.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Key {
    pub id: Id,
    pub iv: String,
}

/// `enckeys` row: a copy of a content key wrapped for one recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct EncryptedKeyGrant {
    pub id: Id,
    /// The wrapped key's id.
    pub key: Id,
    /// Recipient public key.
    pub public_key: String,
    pub iv: String,
    pub nonce: String,
    /// Opaque wrapped key material.
    pub value: String,
}

impl EncryptedKeyGrant {
    /// Whether this grant wraps `key_id` for the holder of `public_key`.
    pub fn unlocks(&self, key_id: Id, public_key: &str) -> bool {
        self.key == key_id && self.public_key == public_key
    }
}

/// `profiles` row. One per account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub ipfs_hash: String,
    #[serde(default, with = "ref_id")]
    pub key: Option<Id>,
}

/// `posts` row. Stored in the contract scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PostRow {
    pub id: Id,
    pub account: String,
    pub is_folder: bool,
    /// Id of the posted folder or file.
    pub subject: Id,
    #[serde(default)]
    pub caption: String,
}
