//! # filespace-core
//!
//! Rebuilds an account's filespace (folders, files, versions, key material and
//! likes) from the flat tables of the filespace ledger contract, and keeps the
//! rebuilt tree in sync as mutations are submitted.
//!
//! ## Modules
//!
//! - [`ledger`]: the external ledger collaborator trait.
//! - [`tables`]: fetching and decoding one account's row sets.
//! - [`index`]: id-keyed lookup maps over the row sets.
//! - [`collapse`]: linking the maps into one rooted tree.
//! - [`ops`]: mutation operations (submit, then patch the tree).
//! - [`lookup`]: read-side queries (profiles, posts, accounts).
//! - [`session`]: the per-identity session holding the tree.

pub mod clock;
pub mod collapse;
pub mod diagnostics;
pub mod index;
pub mod ledger;
pub mod lookup;
pub mod ops;
pub mod pipeline;
pub mod session;
pub mod tables;

#[cfg(test)]
pub(crate) mod testing;

use filespace_types::action::ActionKind;
use filespace_types::Id;
use serde::{Deserialize, Serialize};

pub use collapse::Collapsed;
pub use diagnostics::SkipReason;
pub use ledger::{Ledger, LedgerError};
pub use session::{Session, SessionConfig};

/// Errors returned by filespace operations.
#[derive(Debug, thiserror::Error)]
pub enum FilespaceError {
    /// Fetching from the ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A submission failed; later dependent steps were not attempted.
    #[error("{step} failed: {source}")]
    Step {
        step: ActionKind,
        #[source]
        source: LedgerError,
    },

    #[error("folder not found: {0}")]
    FolderNotFound(Id),

    #[error("file not found: {0}")]
    FileNotFound(Id),

    #[error("version not found: {0}")]
    VersionNotFound(Id),

    /// No tree has been loaded into the session yet.
    #[error("filespace not loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, FilespaceError>;

/// The caller's identity, supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account: String,
    /// Public key that encrypted-key grants are addressed to.
    pub public_key: String,
}

impl Identity {
    pub fn new(account: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            public_key: public_key.into(),
        }
    }
}
