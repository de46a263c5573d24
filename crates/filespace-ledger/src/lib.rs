//! # filespace-ledger
//!
//! A local, SQLite-backed ledger speaking the filespace contract.
//!
//! All accounts share one database. Each contract table is stored as JSON
//! row bodies keyed by `(scope, table, id)`, so the rows served here are the
//! same shape the contract serves remotely.
//!
//! ## Schema
//!
//! - WAL mode
//! - Schema version stored in `PRAGMA user_version`

pub mod apply;
pub mod migrations;
pub mod queries;
pub mod schema;

use std::path::Path;

use filespace_core::{Ledger, LedgerError};
use filespace_types::action::Action;
use filespace_types::rows::Table;
use filespace_types::CONTRACT_ACCOUNT;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::debug;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Rows returned per table fetch unless configured otherwise.
pub const DEFAULT_ROW_LIMIT: u32 = 500;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(_) | DbError::Constraint(_) => LedgerError::Rejected(err.to_string()),
            DbError::Serialization(detail) => LedgerError::Malformed(detail),
            DbError::Sqlite(_) | DbError::Migration(_) => LedgerError::Unavailable(err.to_string()),
        }
    }
}

/// Open or create the ledger database at the given path.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// [`Ledger`] over a SQLite connection.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    contract_account: String,
    row_limit: u32,
}

impl SqliteLedger {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            contract_account: CONTRACT_ACCOUNT.to_string(),
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// An empty in-memory ledger.
    pub fn memory() -> Result<Self> {
        Ok(Self::new(open_memory()?))
    }

    pub fn with_contract_account(mut self, contract_account: impl Into<String>) -> Self {
        self.contract_account = contract_account.into();
        self
    }

    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Register `account` and its active public key.
    pub async fn register_account(&self, account: &str, public_key: &str) -> Result<()> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let conn = self.conn.lock().await;
        queries::accounts::register(&conn, account, public_key, now)
    }
}

impl Ledger for SqliteLedger {
    async fn fetch_table(
        &self,
        scope: &str,
        table: Table,
    ) -> std::result::Result<Vec<serde_json::Value>, LedgerError> {
        let conn = self.conn.lock().await;
        let rows = queries::rows::select(&conn, scope, table, self.row_limit)?;
        if rows.len() == self.row_limit as usize {
            debug!(scope, %table, limit = self.row_limit, "Table fetch hit the row limit");
        }
        Ok(rows)
    }

    async fn submit(&self, action: &Action, authorizer: &str) -> std::result::Result<(), LedgerError> {
        if action.actor() != authorizer {
            return Err(LedgerError::Unauthorized {
                authorizer: authorizer.to_string(),
                actor: action.actor().to_string(),
            });
        }
        let conn = self.conn.lock().await;
        apply::apply(&conn, action, &self.contract_account)?;
        debug!(action = %action.kind(), authorizer, "Action applied");
        Ok(())
    }

    async fn list_scopes(&self, table: Table) -> std::result::Result<Vec<String>, LedgerError> {
        let conn = self.conn.lock().await;
        Ok(queries::rows::scopes(&conn, table)?)
    }

    async fn active_public_key(
        &self,
        account: &str,
    ) -> std::result::Result<Option<String>, LedgerError> {
        let conn = self.conn.lock().await;
        Ok(queries::accounts::public_key(&conn, account)?)
    }
}

#[cfg(test)]
mod tests {
    use filespace_types::action::{AddFolder, AddKey};

    use super::*;

    fn add_folder(user: &str, id: u64) -> Action {
        Action::AddFolder(AddFolder {
            user: user.to_string(),
            id,
            name: "root".to_string(),
            parent_folder: None,
        })
    }

    #[test]
    fn test_open_memory() {
        let conn = open_memory().expect("open in-memory db");
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("get user_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_wal_mode() {
        let conn = open_memory().expect("open");
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("get journal_mode");
        // In-memory databases use "memory" mode, not WAL
        assert!(mode == "wal" || mode == "memory");
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            LedgerError::from(DbError::Constraint("dup".into())),
            LedgerError::Rejected(_)
        ));
        assert!(matches!(
            LedgerError::from(DbError::Serialization("bad".into())),
            LedgerError::Malformed(_)
        ));
        assert!(matches!(
            LedgerError::from(DbError::Migration("old".into())),
            LedgerError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_submit_and_fetch() {
        let ledger = SqliteLedger::memory().expect("ledger");
        ledger.submit(&add_folder("alice", 1), "alice").await.expect("submit");
        let rows = ledger.fetch_table("alice", Table::Folders).await.expect("fetch");
        assert_eq!(rows.len(), 1);
        assert!(ledger.fetch_table("bob", Table::Folders).await.expect("fetch").is_empty());
    }

    #[tokio::test]
    async fn test_foreign_authorizer_refused() {
        let ledger = SqliteLedger::memory().expect("ledger");
        let result = ledger.submit(&add_folder("alice", 1), "mallory").await;
        assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));
        assert!(ledger.list_scopes(Table::Folders).await.expect("scopes").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let ledger = SqliteLedger::memory().expect("ledger");
        ledger.submit(&add_folder("alice", 1), "alice").await.expect("first");
        let result = ledger.submit(&add_folder("alice", 1), "alice").await;
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_row_limit() {
        let ledger = SqliteLedger::memory().expect("ledger").with_row_limit(2);
        for id in 1..=3 {
            let action = Action::AddKey(AddKey {
                user: "alice".to_string(),
                id,
                iv: format!("iv{id}"),
            });
            ledger.submit(&action, "alice").await.expect("submit");
        }
        let rows = ledger.fetch_table("alice", Table::Keys).await.expect("fetch");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_account_registry() {
        let ledger = SqliteLedger::memory().expect("ledger");
        ledger.register_account("alice", "PUB_ALICE").await.expect("register");
        assert_eq!(
            ledger.active_public_key("alice").await.expect("key"),
            Some("PUB_ALICE".to_string())
        );
        assert_eq!(ledger.active_public_key("bob").await.expect("key"), None);
    }
}
