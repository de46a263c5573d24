//! The per-identity session holding the collapsed tree.
//!
//! A [`Session`] owns its ledger handle and tree; nothing is global, so
//! independent sessions can live side by side. Mutations take `&mut self`,
//! which keeps the read-submit-patch sequence of each operation exclusive.

use filespace_types::rows::PostRow;
use filespace_types::tree::{File, Folder, Profile};
use filespace_types::{Id, CONTRACT_ACCOUNT, ROOT_FOLDER_ID};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collapse::{collapse_tables, Collapsed};
use crate::diagnostics::SkipReason;
use crate::ledger::Ledger;
use crate::ops::{self, KeyShare, NewFile, NewKey, NewPost, ProfileKeys};
use crate::tables::fetch_tables;
use crate::{lookup, FilespaceError, Identity, Result};

/// Filespace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Account holding the contract-scoped tables (likes, posts).
    #[serde(default = "default_contract_account")]
    pub contract_account: String,
    /// Id given to a newly created root folder.
    #[serde(default = "default_root_folder_id")]
    pub root_folder_id: Id,
    /// Name given to a newly created root folder.
    #[serde(default = "default_root_folder_name")]
    pub root_folder_name: String,
}

fn default_contract_account() -> String {
    CONTRACT_ACCOUNT.to_string()
}

fn default_root_folder_id() -> Id {
    ROOT_FOLDER_ID
}

fn default_root_folder_name() -> String {
    "root".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contract_account: default_contract_account(),
            root_folder_id: default_root_folder_id(),
            root_folder_name: default_root_folder_name(),
        }
    }
}

/// One identity's view of the filespace.
pub struct Session<L> {
    ledger: L,
    identity: Identity,
    config: SessionConfig,
    root: Option<Folder>,
    diagnostics: Vec<SkipReason>,
}

impl<L: Ledger> Session<L> {
    pub fn new(ledger: L, identity: Identity, config: SessionConfig) -> Self {
        Self {
            ledger,
            identity,
            config,
            root: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The held tree, if loaded.
    pub fn root(&self) -> Option<&Folder> {
        self.root.as_ref()
    }

    /// Anomalies found by the last full load.
    pub fn diagnostics(&self) -> &[SkipReason] {
        &self.diagnostics
    }

    /// Fetch and collapse `account`'s filespace as seen by this identity.
    pub async fn load(&self, account: &str) -> Result<Collapsed> {
        let (tables, mut diagnostics) =
            fetch_tables(&self.ledger, account, &self.config.contract_account).await?;
        let mut collapsed = collapse_tables(&tables, account, &self.identity.public_key);
        diagnostics.append(&mut collapsed.diagnostics);
        collapsed.diagnostics = diagnostics;
        Ok(collapsed)
    }

    /// Reload the own filespace, replacing the held tree.
    ///
    /// Returns whether a root folder was found.
    pub async fn refresh(&mut self) -> Result<bool> {
        let collapsed = self.load(&self.identity.account).await?;
        if !collapsed.diagnostics.is_empty() {
            warn!(
                account = %self.identity.account,
                anomalies = collapsed.diagnostics.len(),
                "Filespace loaded with anomalies"
            );
        }
        self.diagnostics = collapsed.diagnostics;
        self.root = collapsed.root;
        Ok(self.root.is_some())
    }

    /// Load the own filespace, creating the root folder if there is none yet.
    ///
    /// Concurrent first loads are not coordinated: both submit the root, and
    /// whether the second is refused is up to the ledger.
    pub async fn resolve_root(&mut self) -> Result<&Folder> {
        if self.refresh().await? {
            info!(account = %self.identity.account, "Filespace loaded");
        } else {
            info!(account = %self.identity.account, "No root folder, creating one");
            let root = ops::create_folder(
                &self.ledger,
                &self.identity,
                self.config.root_folder_id,
                &self.config.root_folder_name,
                None,
            )
            .await?;
            self.root = Some(root);
        }
        self.root.as_ref().ok_or(FilespaceError::NotLoaded)
    }

    /// Another account's filespace. Not adopted as the session's tree.
    pub async fn other_filespace(&self, account: &str) -> Result<Collapsed> {
        self.load(account).await
    }

    pub async fn account_list(&self) -> Result<Vec<String>> {
        lookup::account_list(&self.ledger).await
    }

    pub async fn active_public_key(&self, account: &str) -> Result<Option<String>> {
        Ok(self.ledger.active_public_key(account).await?)
    }

    pub async fn profile(&self, account: &str) -> Result<Option<Profile>> {
        lookup::profile(&self.ledger, account, &self.identity.public_key).await
    }

    pub async fn posts(&self) -> Result<Vec<PostRow>> {
        lookup::posts(&self.ledger, &self.config.contract_account).await
    }

    /// Whether any version in the held tree is stored at `ipfs_hash`.
    pub fn contains_hash(&self, ipfs_hash: &str) -> bool {
        self.root
            .as_ref()
            .is_some_and(|root| root.contains_hash(ipfs_hash))
    }

    /// Create a folder under `parent_id`, or a detached folder without one.
    pub async fn create_folder(&mut self, id: Id, name: &str, parent_id: Option<Id>) -> Result<Folder> {
        let parent = match parent_id {
            Some(parent_id) => Some(
                self.root
                    .as_mut()
                    .ok_or(FilespaceError::NotLoaded)?
                    .find_folder_mut(parent_id)
                    .ok_or(FilespaceError::FolderNotFound(parent_id))?,
            ),
            None => None,
        };
        ops::create_folder(&self.ledger, &self.identity, id, name, parent).await
    }

    /// Create a file with its first version under `parent_id`.
    pub async fn create_file(&mut self, parent_id: Id, new: NewFile) -> Result<File> {
        let parent = self
            .root
            .as_mut()
            .ok_or(FilespaceError::NotLoaded)?
            .find_folder_mut(parent_id)
            .ok_or(FilespaceError::FolderNotFound(parent_id))?;
        ops::create_file(&self.ledger, &self.identity, parent, new).await
    }

    /// Delete a folder. Deleting the root changes only the ledger.
    pub async fn delete_folder(&mut self, id: Id) -> Result<()> {
        let root = self.root.as_mut().ok_or(FilespaceError::NotLoaded)?;
        let parent = if root.id == id {
            None
        } else {
            Some(
                root.parent_of_folder_mut(id)
                    .ok_or(FilespaceError::FolderNotFound(id))?,
            )
        };
        ops::delete_folder(&self.ledger, &self.identity, id, parent).await?;
        Ok(())
    }

    pub async fn delete_file(&mut self, id: Id) -> Result<()> {
        let parent = self
            .root
            .as_mut()
            .ok_or(FilespaceError::NotLoaded)?
            .parent_of_file_mut(id)
            .ok_or(FilespaceError::FileNotFound(id))?;
        ops::delete_file(&self.ledger, &self.identity, id, Some(parent)).await?;
        Ok(())
    }

    /// Like a version in the held tree.
    pub async fn like_version(&mut self, version_id: Id) -> Result<()> {
        let version = self
            .root
            .as_mut()
            .ok_or(FilespaceError::NotLoaded)?
            .find_version_mut(version_id)
            .ok_or(FilespaceError::VersionNotFound(version_id))?;
        ops::like_version(&self.ledger, &self.identity, version, &self.identity.account).await
    }

    /// Like a version in a tree obtained from [`Session::other_filespace`].
    pub async fn like_version_in(&self, tree: &mut Folder, version_id: Id) -> Result<()> {
        let liked = tree.owner.clone();
        let version = tree
            .find_version_mut(version_id)
            .ok_or(FilespaceError::VersionNotFound(version_id))?;
        ops::like_version(&self.ledger, &self.identity, version, &liked).await
    }

    pub async fn share_key(&self, share: KeyShare) -> Result<()> {
        ops::share_key(&self.ledger, &self.identity, share).await
    }

    pub async fn set_profile(&self, ipfs_hash: &str, key: Option<NewKey>) -> Result<ProfileKeys> {
        ops::set_profile(&self.ledger, &self.identity, ipfs_hash, key).await
    }

    pub async fn add_post(&self, post: NewPost) -> Result<()> {
        ops::add_post(&self.ledger, &self.identity, post).await
    }
}
