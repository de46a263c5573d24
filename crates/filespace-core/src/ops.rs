//! Mutation operations.
//!
//! Every operation submits to the ledger first and patches the local tree
//! only after the ledger accepted the change. A failed submission leaves the
//! tree untouched. Callers pass the node a change hangs off (usually the
//! parent folder) explicitly; nodes hold no links back to their parents.

use filespace_types::action::{
    Action, AddEncKey, AddFile, AddFolder, AddKey, AddLike, AddPost, AddVersion, DeleteRow,
    SetCurrentVersion, SetProfile,
};
use filespace_types::rows::{EncryptedKeyGrant, Key};
use filespace_types::tree::{File, Folder, Version};
use filespace_types::Id;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock;
use crate::ledger::Ledger;
use crate::pipeline::{submit_one, submit_pipeline};
use crate::{Identity, Result};

/// A content key to register alongside new content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKey {
    pub iv: String,
    /// The key wrapped for one recipient, usually the caller.
    #[serde(default)]
    pub wrapped: Option<WrappedKey>,
}

/// A content key wrapped for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    pub public_key: String,
    pub iv: String,
    pub nonce: String,
    pub value: String,
}

/// Content of a file's first version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    /// Used as the id of the file, its first version, and its key.
    pub id: Id,
    pub name: String,
    pub date: u64,
    pub ipfs_hash: String,
    pub sha256: String,
    #[serde(default)]
    pub key: Option<NewKey>,
}

/// A grant of an existing key to another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShare {
    pub id: Id,
    pub key_id: Id,
    #[serde(flatten)]
    pub wrapped: WrappedKey,
}

/// A post announcing a folder or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub id: Id,
    pub is_folder: bool,
    pub subject: Id,
    #[serde(default)]
    pub caption: String,
}

/// Key material of a freshly set profile, for immediate display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileKeys {
    pub key: Option<Key>,
    pub grant: Option<EncryptedKeyGrant>,
}

/// Steps registering `key` under `key_id`, wrapped under grant `grant_id`.
fn key_steps(identity: &Identity, key_id: Id, grant_id: Id, key: &NewKey) -> Vec<Action> {
    let mut steps = vec![Action::AddKey(AddKey {
        user: identity.account.clone(),
        id: key_id,
        iv: key.iv.clone(),
    })];
    if let Some(wrapped) = &key.wrapped {
        steps.push(Action::AddEncKey(AddEncKey {
            user: identity.account.clone(),
            id: grant_id,
            key: key_id,
            public_key: wrapped.public_key.clone(),
            iv: wrapped.iv.clone(),
            nonce: wrapped.nonce.clone(),
            value: wrapped.value.clone(),
        }));
    }
    steps
}

/// The key and grant a fresh collapse would show the caller: both are set
/// only when the key was wrapped for the caller's own public key.
fn visible_key_material(
    identity: &Identity,
    key_id: Id,
    grant_id: Id,
    key: Option<&NewKey>,
) -> (Option<Key>, Option<EncryptedKeyGrant>) {
    let Some(key) = key else {
        return (None, None);
    };
    match &key.wrapped {
        Some(wrapped) if wrapped.public_key == identity.public_key => (
            Some(Key {
                id: key_id,
                iv: key.iv.clone(),
            }),
            Some(EncryptedKeyGrant {
                id: grant_id,
                key: key_id,
                public_key: wrapped.public_key.clone(),
                iv: wrapped.iv.clone(),
                nonce: wrapped.nonce.clone(),
                value: wrapped.value.clone(),
            }),
        ),
        _ => (None, None),
    }
}

/// Create a folder, attaching it to `parent` when one is given.
///
/// Returns the new (empty) folder.
pub async fn create_folder<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    id: Id,
    name: &str,
    parent: Option<&mut Folder>,
) -> Result<Folder> {
    let parent_id = parent.as_ref().map(|folder| folder.id);
    submit_one(
        ledger,
        Action::AddFolder(AddFolder {
            user: identity.account.clone(),
            id,
            name: name.to_string(),
            parent_folder: parent_id,
        }),
        &identity.account,
    )
    .await?;

    let folder = Folder::new(id, name, identity.account.as_str(), parent_id);
    if let Some(parent) = parent {
        parent.child_folders.push(folder.clone());
    }
    info!(id, name, parent = ?parent_id, "Created folder");
    Ok(folder)
}

/// Create a file with its first version inside `parent`.
///
/// Submits, in order: key, wrapped key, file, version, current-version. The
/// first failing step aborts the rest and the tree is left untouched.
pub async fn create_file<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    parent: &mut Folder,
    new: NewFile,
) -> Result<File> {
    let key_id = new.key.as_ref().map(|_| new.id);
    let user = identity.account.clone();

    let mut steps = match &new.key {
        Some(key) => key_steps(identity, new.id, new.id, key),
        None => Vec::new(),
    };
    steps.push(Action::AddFile(AddFile {
        user: user.clone(),
        id: new.id,
        name: new.name.clone(),
        parent_folder: parent.id,
        current_version: None,
    }));
    steps.push(Action::AddVersion(AddVersion {
        user: user.clone(),
        id: new.id,
        ipfs_hash: new.ipfs_hash.clone(),
        sha256: new.sha256.clone(),
        date: new.date,
        file: new.id,
        key: key_id,
    }));
    steps.push(Action::SetCurrentVersion(SetCurrentVersion {
        user,
        id: new.id,
        new_current_version: new.id,
    }));

    submit_pipeline(ledger, &steps, &identity.account).await?;

    let (key, grant) = visible_key_material(identity, new.id, new.id, new.key.as_ref());
    let version = Version {
        id: new.id,
        file: new.id,
        ipfs_hash: new.ipfs_hash,
        sha256: new.sha256,
        date: new.date,
        key_id,
        key,
        grant,
        likes: Vec::new(),
    };
    let file = File {
        id: new.id,
        name: new.name,
        parent_id: parent.id,
        current_version: Some(version.id),
        versions: vec![version],
    };
    parent.child_files.push(file.clone());
    info!(id = file.id, parent = parent.id, encrypted = key_id.is_some(), "Created file");
    Ok(file)
}

/// Delete folder `id`, detaching it from `parent` when one is given.
///
/// Without a parent (deleting the root or a detached folder) only the ledger
/// changes.
pub async fn delete_folder<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    id: Id,
    parent: Option<&mut Folder>,
) -> Result<Option<Folder>> {
    submit_one(
        ledger,
        Action::DeleteFolder(DeleteRow {
            user: identity.account.clone(),
            id,
        }),
        &identity.account,
    )
    .await?;
    info!(id, "Deleted folder");
    Ok(parent.and_then(|parent| parent.remove_child_folder(id)))
}

/// Delete file `id`, detaching it from `parent` when one is given.
pub async fn delete_file<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    id: Id,
    parent: Option<&mut Folder>,
) -> Result<Option<File>> {
    submit_one(
        ledger,
        Action::DeleteFile(DeleteRow {
            user: identity.account.clone(),
            id,
        }),
        &identity.account,
    )
    .await?;
    info!(id, "Deleted file");
    Ok(parent.and_then(|parent| parent.remove_child_file(id)))
}

/// Like `version`, which lives in `liked`'s filespace.
pub async fn like_version<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    version: &mut Version,
    liked: &str,
) -> Result<()> {
    submit_one(
        ledger,
        Action::AddLike(AddLike {
            user: identity.account.clone(),
            id: clock::timestamp_id(),
            liked: liked.to_string(),
            version: version.id,
        }),
        &identity.account,
    )
    .await?;
    version.likes.push(identity.account.clone());
    Ok(())
}

/// Grant an existing key to another public key.
///
/// The tree is not patched: grants become visible on the next full collapse.
pub async fn share_key<L: Ledger>(ledger: &L, identity: &Identity, share: KeyShare) -> Result<()> {
    let KeyShare { id, key_id, wrapped } = share;
    submit_one(
        ledger,
        Action::AddEncKey(AddEncKey {
            user: identity.account.clone(),
            id,
            key: key_id,
            public_key: wrapped.public_key,
            iv: wrapped.iv,
            nonce: wrapped.nonce,
            value: wrapped.value,
        }),
        &identity.account,
    )
    .await?;
    info!(id, key = key_id, "Shared key");
    Ok(())
}

/// Set the caller's profile content, registering its key first when given.
pub async fn set_profile<L: Ledger>(
    ledger: &L,
    identity: &Identity,
    ipfs_hash: &str,
    key: Option<NewKey>,
) -> Result<ProfileKeys> {
    let id = clock::timestamp_id();
    let key_id = key.as_ref().map(|_| id);

    let mut steps = match &key {
        Some(key) => key_steps(identity, id, id, key),
        None => Vec::new(),
    };
    steps.push(Action::SetProfile(SetProfile {
        user: identity.account.clone(),
        ipfs_hash: ipfs_hash.to_string(),
        key: key_id,
    }));

    submit_pipeline(ledger, &steps, &identity.account).await?;

    let (key, grant) = visible_key_material(identity, id, id, key.as_ref());
    Ok(ProfileKeys { key, grant })
}

/// Publish a post about a folder or file.
pub async fn add_post<L: Ledger>(ledger: &L, identity: &Identity, post: NewPost) -> Result<()> {
    submit_one(
        ledger,
        Action::AddPost(AddPost {
            account: identity.account.clone(),
            id: post.id,
            is_folder: post.is_folder,
            subject: post.subject,
            caption: post.caption,
        }),
        &identity.account,
    )
    .await
}
