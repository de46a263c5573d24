//! Remote mutations accepted by the filespace contract.
//!
//! Each action serializes as `{"name": "<action>", "data": {...}}` with the
//! contract's field schema.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ref_id, Id};

/// A single ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum Action {
    #[serde(rename = "addfolder")]
    AddFolder(AddFolder),
    #[serde(rename = "deletefolder")]
    DeleteFolder(DeleteRow),
    #[serde(rename = "addfile")]
    AddFile(AddFile),
    #[serde(rename = "deletefile")]
    DeleteFile(DeleteRow),
    #[serde(rename = "addversion")]
    AddVersion(AddVersion),
    #[serde(rename = "setcurrentve")]
    SetCurrentVersion(SetCurrentVersion),
    #[serde(rename = "addkey")]
    AddKey(AddKey),
    #[serde(rename = "addenckey")]
    AddEncKey(AddEncKey),
    #[serde(rename = "addlike")]
    AddLike(AddLike),
    #[serde(rename = "setprofile")]
    SetProfile(SetProfile),
    #[serde(rename = "addpost")]
    AddPost(AddPost),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFolder {
    pub user: String,
    pub id: Id,
    pub name: String,
    #[serde(default, with = "ref_id")]
    pub parent_folder: Option<Id>,
}

/// Payload of `deletefolder` and `deletefile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRow {
    pub user: String,
    pub id: Id,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFile {
    pub user: String,
    pub id: Id,
    pub name: String,
    pub parent_folder: Id,
    #[serde(default, with = "ref_id")]
    pub current_version: Option<Id>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVersion {
    pub user: String,
    pub id: Id,
    pub ipfs_hash: String,
    pub sha256: String,
    pub date: u64,
    pub file: Id,
    #[serde(default, with = "ref_id")]
    pub key: Option<Id>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCurrentVersion {
    pub user: String,
    /// File id.
    pub id: Id,
    pub new_current_version: Id,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddKey {
    pub user: String,
    pub id: Id,
    pub iv: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEncKey {
    pub user: String,
    pub id: Id,
    pub key: Id,
    pub public_key: String,
    pub iv: String,
    pub nonce: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLike {
    pub user: String,
    pub id: Id,
    pub liked: String,
    pub version: Id,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProfile {
    pub user: String,
    pub ipfs_hash: String,
    #[serde(default, with = "ref_id")]
    pub key: Option<Id>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPost {
    pub account: String,
    pub id: Id,
    pub is_folder: bool,
    pub subject: Id,
    pub caption: String,
}

/// Discriminant of an [`Action`], used to report which pipeline step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AddFolder,
    DeleteFolder,
    AddFile,
    DeleteFile,
    AddVersion,
    SetCurrentVersion,
    AddKey,
    AddEncKey,
    AddLike,
    SetProfile,
    AddPost,
}

impl ActionKind {
    /// Action name on the ledger.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::AddFolder => "addfolder",
            ActionKind::DeleteFolder => "deletefolder",
            ActionKind::AddFile => "addfile",
            ActionKind::DeleteFile => "deletefile",
            ActionKind::AddVersion => "addversion",
            ActionKind::SetCurrentVersion => "setcurrentve",
            ActionKind::AddKey => "addkey",
            ActionKind::AddEncKey => "addenckey",
            ActionKind::AddLike => "addlike",
            ActionKind::SetProfile => "setprofile",
            ActionKind::AddPost => "addpost",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AddFolder(_) => ActionKind::AddFolder,
            Action::DeleteFolder(_) => ActionKind::DeleteFolder,
            Action::AddFile(_) => ActionKind::AddFile,
            Action::DeleteFile(_) => ActionKind::DeleteFile,
            Action::AddVersion(_) => ActionKind::AddVersion,
            Action::SetCurrentVersion(_) => ActionKind::SetCurrentVersion,
            Action::AddKey(_) => ActionKind::AddKey,
            Action::AddEncKey(_) => ActionKind::AddEncKey,
            Action::AddLike(_) => ActionKind::AddLike,
            Action::SetProfile(_) => ActionKind::SetProfile,
            Action::AddPost(_) => ActionKind::AddPost,
        }
    }

    /// The account that must authorize this action.
    pub fn actor(&self) -> &str {
        match self {
            Action::AddFolder(a) => &a.user,
            Action::DeleteFolder(a) | Action::DeleteFile(a) => &a.user,
            Action::AddFile(a) => &a.user,
            Action::AddVersion(a) => &a.user,
            Action::SetCurrentVersion(a) => &a.user,
            Action::AddKey(a) => &a.user,
            Action::AddEncKey(a) => &a.user,
            Action::AddLike(a) => &a.user,
            Action::SetProfile(a) => &a.user,
            Action::AddPost(a) => &a.account,
        }
    }
}
