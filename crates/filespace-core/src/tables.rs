//! Fetching and decoding one account's table set.

use filespace_types::rows::{
    EncryptedKeyGrant, FileRow, FolderRow, Key, LikeRow, Table, VersionRow,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::diagnostics::SkipReason;
use crate::ledger::Ledger;
use crate::Result;

/// The six row sets that make up one account's filespace, in ledger row
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    pub folders: Vec<FolderRow>,
    pub files: Vec<FileRow>,
    pub versions: Vec<VersionRow>,
    /// Likes of every account; filtered by owner during collapse.
    pub likes: Vec<LikeRow>,
    pub keys: Vec<Key>,
    pub grants: Vec<EncryptedKeyGrant>,
}

/// Decode raw rows, skipping (and reporting) any row that does not match the
/// table's schema.
pub fn decode_rows<T: DeserializeOwned>(
    table: Table,
    raw: Vec<serde_json::Value>,
    diagnostics: &mut Vec<SkipReason>,
) -> Vec<T> {
    let mut rows = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(%table, index, error = %e, "Skipping malformed row");
                diagnostics.push(SkipReason::MalformedRow {
                    table,
                    index,
                    detail: e.to_string(),
                });
            }
        }
    }
    rows
}

async fn fetch_scoped<L: Ledger>(
    ledger: &L,
    account: &str,
    contract_account: &str,
    table: Table,
) -> Result<Vec<serde_json::Value>> {
    let scope = if table.is_contract_scoped() {
        contract_account
    } else {
        account
    };
    Ok(ledger.fetch_table(scope, table).await?)
}

/// Fetch `account`'s tables. Likes come from the contract scope.
///
/// Tables are fetched one after another; a failed fetch aborts the whole
/// load, while malformed rows are only reported.
pub async fn fetch_tables<L: Ledger>(
    ledger: &L,
    account: &str,
    contract_account: &str,
) -> Result<(TableSet, Vec<SkipReason>)> {
    let mut diagnostics = Vec::new();

    let folders = fetch_scoped(ledger, account, contract_account, Table::Folders).await?;
    let files = fetch_scoped(ledger, account, contract_account, Table::Files).await?;
    let versions = fetch_scoped(ledger, account, contract_account, Table::Versions).await?;
    let likes = fetch_scoped(ledger, account, contract_account, Table::Likes).await?;
    let keys = fetch_scoped(ledger, account, contract_account, Table::Keys).await?;
    let grants = fetch_scoped(ledger, account, contract_account, Table::EncKeys).await?;

    let tables = TableSet {
        folders: decode_rows(Table::Folders, folders, &mut diagnostics),
        files: decode_rows(Table::Files, files, &mut diagnostics),
        versions: decode_rows(Table::Versions, versions, &mut diagnostics),
        likes: decode_rows(Table::Likes, likes, &mut diagnostics),
        keys: decode_rows(Table::Keys, keys, &mut diagnostics),
        grants: decode_rows(Table::EncKeys, grants, &mut diagnostics),
    };

    debug!(
        account,
        folders = tables.folders.len(),
        files = tables.files.len(),
        versions = tables.versions.len(),
        likes = tables.likes.len(),
        "Fetched filespace tables"
    );

    Ok((tables, diagnostics))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::MockLedger;

    #[test]
    fn test_decode_skips_malformed_rows() {
        let mut diagnostics = Vec::new();
        let rows: Vec<FolderRow> = decode_rows(
            Table::Folders,
            vec![
                json!({"id": 1, "name": "root", "parent_folder": 0}),
                json!({"id": "two", "name": "bad"}),
                json!({"id": 3, "name": "docs", "parent_folder": 1}),
            ],
            &mut diagnostics,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0],
            SkipReason::MalformedRow {
                table: Table::Folders,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_input_is_valid() {
        let mut diagnostics = Vec::new();
        let rows: Vec<Key> = decode_rows(Table::Keys, Vec::new(), &mut diagnostics);
        assert!(rows.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_likes_fetched_from_contract_scope() {
        let ledger = MockLedger::new()
            .with_rows("alice", Table::Folders, vec![json!({"id": 1, "name": "root", "parent_folder": 0})])
            .with_rows(
                "filespace",
                Table::Likes,
                vec![json!({"id": 1, "liker": "bob", "liked": "alice", "version": 100})],
            )
            .with_rows(
                "alice",
                Table::Likes,
                vec![json!({"id": 2, "liker": "eve", "liked": "alice", "version": 100})],
            );

        let (tables, diagnostics) = fetch_tables(&ledger, "alice", "filespace")
            .await
            .expect("fetch");
        assert!(diagnostics.is_empty());
        assert_eq!(tables.folders.len(), 1);
        assert_eq!(tables.likes.len(), 1);
        assert_eq!(tables.likes[0].liker, "bob");
    }
}
