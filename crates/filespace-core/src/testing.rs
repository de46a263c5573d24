//! In-memory ledger used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use filespace_types::action::{Action, ActionKind};
use filespace_types::rows::Table;

use crate::ledger::{Ledger, LedgerError};

/// Serves fixed rows and records every submission.
#[derive(Default)]
pub struct MockLedger {
    tables: HashMap<(String, Table), Vec<serde_json::Value>>,
    public_keys: HashMap<String, String>,
    fail_on: Mutex<Option<ActionKind>>,
    attempted: Mutex<Vec<Action>>,
    accepted: Mutex<Vec<Action>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, scope: &str, table: Table, rows: Vec<serde_json::Value>) -> Self {
        self.tables.insert((scope.to_string(), table), rows);
        self
    }

    pub fn with_public_key(mut self, account: &str, public_key: &str) -> Self {
        self.public_keys
            .insert(account.to_string(), public_key.to_string());
        self
    }

    /// Reject every later submission of `kind`.
    pub fn fail_on(&self, kind: ActionKind) {
        *self.fail_on.lock().expect("lock") = Some(kind);
    }

    pub fn attempted_kinds(&self) -> Vec<ActionKind> {
        self.attempted
            .lock()
            .expect("lock")
            .iter()
            .map(Action::kind)
            .collect()
    }

    pub fn submitted(&self) -> Vec<Action> {
        self.accepted.lock().expect("lock").clone()
    }

    pub fn submitted_kinds(&self) -> Vec<ActionKind> {
        self.submitted().iter().map(Action::kind).collect()
    }
}

impl Ledger for MockLedger {
    async fn fetch_table(
        &self,
        scope: &str,
        table: Table,
    ) -> Result<Vec<serde_json::Value>, LedgerError> {
        Ok(self
            .tables
            .get(&(scope.to_string(), table))
            .cloned()
            .unwrap_or_default())
    }

    async fn submit(&self, action: &Action, authorizer: &str) -> Result<(), LedgerError> {
        self.attempted.lock().expect("lock").push(action.clone());
        if *self.fail_on.lock().expect("lock") == Some(action.kind()) {
            return Err(LedgerError::Rejected(format!("{} refused", action.kind())));
        }
        if action.actor() != authorizer {
            return Err(LedgerError::Unauthorized {
                authorizer: authorizer.to_string(),
                actor: action.actor().to_string(),
            });
        }
        self.accepted.lock().expect("lock").push(action.clone());
        Ok(())
    }

    async fn list_scopes(&self, table: Table) -> Result<Vec<String>, LedgerError> {
        let mut scopes: Vec<String> = self
            .tables
            .iter()
            .filter(|((_, t), rows)| *t == table && !rows.is_empty())
            .map(|((scope, _), _)| scope.clone())
            .collect();
        scopes.sort();
        Ok(scopes)
    }

    async fn active_public_key(&self, account: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.public_keys.get(account).cloned())
    }
}
