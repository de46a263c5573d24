//! Account registry queries.

use rusqlite::{params, Connection, OptionalExtension};

use crate::Result;

/// Register `name` with its active public key, replacing any previous key.
pub fn register(conn: &Connection, name: &str, public_key: &str, now: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (name, public_key, registered_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET public_key = excluded.public_key",
        params![name, public_key, i64::try_from(now).unwrap_or(i64::MAX)],
    )?;
    Ok(())
}

/// The active public key of `name`, if registered.
pub fn public_key(conn: &Connection, name: &str) -> Result<Option<String>> {
    let key = conn
        .query_row(
            "SELECT public_key FROM accounts WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(key)
}
