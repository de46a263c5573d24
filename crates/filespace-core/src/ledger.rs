//! The external ledger collaborator.
//!
//! The core never talks to the network itself. Implementors of [`Ledger`]
//! fetch table rows and submit actions; this crate only shapes requests and
//! interprets results. Timeouts and retries belong to the implementor.

use std::future::Future;
use std::sync::Arc;

use filespace_types::action::Action;
use filespace_types::rows::Table;

/// Errors reported by a ledger implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The ledger refused the action (constraint, missing row, ...).
    #[error("action rejected: {0}")]
    Rejected(String),

    /// The authorizing account may not perform the action.
    #[error("{authorizer} may not act as {actor}")]
    Unauthorized { authorizer: String, actor: String },

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger returned data that could not be interpreted.
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

/// Read and write access to the filespace contract's tables.
pub trait Ledger: Send + Sync {
    /// Fetch all rows of `table` in `scope`, in ledger row order.
    fn fetch_table(
        &self,
        scope: &str,
        table: Table,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, LedgerError>> + Send;

    /// Submit one action, authorized by `authorizer`.
    fn submit(
        &self,
        action: &Action,
        authorizer: &str,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Every scope holding at least one row of `table`.
    fn list_scopes(
        &self,
        table: Table,
    ) -> impl Future<Output = Result<Vec<String>, LedgerError>> + Send;

    /// The active-permission public key of `account`, if the account exists.
    fn active_public_key(
        &self,
        account: &str,
    ) -> impl Future<Output = Result<Option<String>, LedgerError>> + Send;
}

/// Several sessions may share one ledger handle.
impl<L: Ledger> Ledger for Arc<L> {
    fn fetch_table(
        &self,
        scope: &str,
        table: Table,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, LedgerError>> + Send {
        (**self).fetch_table(scope, table)
    }

    fn submit(
        &self,
        action: &Action,
        authorizer: &str,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send {
        (**self).submit(action, authorizer)
    }

    fn list_scopes(
        &self,
        table: Table,
    ) -> impl Future<Output = Result<Vec<String>, LedgerError>> + Send {
        (**self).list_scopes(table)
    }

    fn active_public_key(
        &self,
        account: &str,
    ) -> impl Future<Output = Result<Option<String>, LedgerError>> + Send {
        (**self).active_public_key(account)
    }
}
