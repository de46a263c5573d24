//! Contract semantics: how each accepted action changes the tables.
//!
//! Account tables are written in the acting account's scope. Likes and posts
//! go to the contract scope. Inserting a taken id, or touching a row that
//! does not exist, is refused.

use filespace_types::action::Action;
use filespace_types::rows::{
    EncryptedKeyGrant, FileRow, FolderRow, Key, LikeRow, PostRow, ProfileRow, Table, VersionRow,
};
use filespace_types::Id;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::queries::rows;
use crate::{DbError, Result};

/// Id of the single `profiles` row of an account.
pub const PROFILE_ROW_ID: Id = 0;

fn encode<T: Serialize>(row: &T) -> Result<Value> {
    serde_json::to_value(row).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| DbError::Serialization(e.to_string()))
}

/// The two scopes an action can write to.
struct Scopes<'a> {
    actor: &'a str,
    contract_account: &'a str,
}

impl<'a> Scopes<'a> {
    fn of(&self, table: Table) -> &'a str {
        if table.is_contract_scoped() {
            self.contract_account
        } else {
            self.actor
        }
    }
}

fn insert<T: Serialize>(conn: &Connection, scopes: &Scopes<'_>, table: Table, id: Id, row: &T) -> Result<()> {
    rows::insert(conn, scopes.of(table), table, id, &encode(row)?)
}

/// Apply one action.
pub fn apply(conn: &Connection, action: &Action, contract_account: &str) -> Result<()> {
    let scopes = Scopes {
        actor: action.actor(),
        contract_account,
    };
    match action {
        Action::AddFolder(a) => insert(
            conn,
            &scopes,
            Table::Folders,
            a.id,
            &FolderRow {
                id: a.id,
                name: a.name.clone(),
                parent_folder: a.parent_folder,
            },
        ),
        Action::DeleteFolder(a) => rows::delete(conn, &a.user, Table::Folders, a.id),
        Action::AddFile(a) => insert(
            conn,
            &scopes,
            Table::Files,
            a.id,
            &FileRow {
                id: a.id,
                name: a.name.clone(),
                parent_folder: a.parent_folder,
                current_version: a.current_version,
            },
        ),
        Action::DeleteFile(a) => rows::delete(conn, &a.user, Table::Files, a.id),
        Action::AddVersion(a) => {
            if !rows::exists(conn, &a.user, Table::Files, a.file)? {
                return Err(DbError::NotFound(format!("files row {} in {}", a.file, a.user)));
            }
            insert(
                conn,
                &scopes,
                Table::Versions,
                a.id,
                &VersionRow {
                    id: a.id,
                    file: a.file,
                    ipfs_hash: a.ipfs_hash.clone(),
                    sha256: a.sha256.clone(),
                    date: a.date,
                    key: a.key,
                },
            )
        }
        Action::SetCurrentVersion(a) => {
            let mut file: FileRow = decode(rows::get(conn, &a.user, Table::Files, a.id)?)?;
            file.current_version = Some(a.new_current_version);
            rows::update(conn, &a.user, Table::Files, a.id, &encode(&file)?)
        }
        Action::AddKey(a) => insert(
            conn,
            &scopes,
            Table::Keys,
            a.id,
            &Key {
                id: a.id,
                iv: a.iv.clone(),
            },
        ),
        Action::AddEncKey(a) => insert(
            conn,
            &scopes,
            Table::EncKeys,
            a.id,
            &EncryptedKeyGrant {
                id: a.id,
                key: a.key,
                public_key: a.public_key.clone(),
                iv: a.iv.clone(),
                nonce: a.nonce.clone(),
                value: a.value.clone(),
            },
        ),
        Action::AddLike(a) => insert(
            conn,
            &scopes,
            Table::Likes,
            a.id,
            &LikeRow {
                id: a.id,
                liker: a.user.clone(),
                liked: a.liked.clone(),
                version: a.version,
            },
        ),
        Action::SetProfile(a) => {
            let row = ProfileRow {
                ipfs_hash: a.ipfs_hash.clone(),
                key: a.key,
            };
            rows::upsert(conn, &a.user, Table::Profiles, PROFILE_ROW_ID, &encode(&row)?)
        }
        Action::AddPost(a) => insert(
            conn,
            &scopes,
            Table::Posts,
            a.id,
            &PostRow {
                id: a.id,
                account: a.account.clone(),
                is_folder: a.is_folder,
                subject: a.subject,
                caption: a.caption.clone(),
            },
        ),
    }
}
