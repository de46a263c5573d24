//! # filespace-types
//!
//! Shared data model for the filespace workspace.
//!
//! - [`rows`]: one typed struct per ledger table, as fetched.
//! - [`tree`]: the collapsed folder / file / version tree.
//! - [`action`]: the remote mutations accepted by the ledger contract.

pub mod action;
pub mod rows;
pub mod tree;

/// Row identifier. Unique within a table; `0` is reserved for "no reference".
pub type Id = u64;

/// The reserved "no reference" id.
pub const NO_REF: Id = 0;

/// Account that owns the filespace contract. Likes and posts are stored in
/// this scope rather than in the acting account's scope.
pub const CONTRACT_ACCOUNT: &str = "filespace";

/// Reserved id of an account's root folder.
pub const ROOT_FOLDER_ID: Id = 1;

/// Serde adapter for reference fields where `0` means "none".
///
/// Missing fields also decode to `None` when combined with `#[serde(default)]`.
pub mod ref_id {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::{Id, NO_REF};

    pub fn serialize<S>(value: &Option<Id>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.unwrap_or(NO_REF))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Id>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Id>::deserialize(deserializer)?;
        Ok(raw.filter(|id| *id != NO_REF))
    }
}
