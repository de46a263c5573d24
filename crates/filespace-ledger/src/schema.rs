//! SQL schema definitions.

/// Schema for the v1 ledger database.
///
/// Every contract table shares `table_rows`; a row is keyed by the account
/// scope it lives in, the table name and its id. The body is the row as the
/// contract serves it, stored as JSON text.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS table_rows (
    scope TEXT NOT NULL,
    table_name TEXT NOT NULL,
    id INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (scope, table_name, id)
);

CREATE INDEX IF NOT EXISTS idx_table_rows_table ON table_rows(table_name, scope);

CREATE TABLE IF NOT EXISTS accounts (
    name TEXT PRIMARY KEY,
    public_key TEXT NOT NULL,
    registered_at INTEGER NOT NULL
);
"#;
