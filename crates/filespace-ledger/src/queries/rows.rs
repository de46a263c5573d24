//! Contract table row queries.

use filespace_types::rows::Table;
use filespace_types::Id;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

use crate::{DbError, Result};

fn sql_id(id: Id) -> Result<i64> {
    i64::try_from(id).map_err(|_| DbError::Constraint(format!("id {id} out of range")))
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Up to `limit` rows of `table` in `scope`, ordered by id.
pub fn select(conn: &Connection, scope: &str, table: Table, limit: u32) -> Result<Vec<Value>> {
    let mut stmt = conn.prepare(
        "SELECT body FROM table_rows
         WHERE scope = ?1 AND table_name = ?2
         ORDER BY id LIMIT ?3",
    )?;
    let bodies = stmt.query_map(params![scope, table.name(), limit], |row| {
        row.get::<_, String>(0)
    })?;

    let mut rows = Vec::new();
    for body in bodies {
        rows.push(parse_body(&body?)?);
    }
    Ok(rows)
}

/// Fetch one row.
pub fn get(conn: &Connection, scope: &str, table: Table, id: Id) -> Result<Value> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM table_rows WHERE scope = ?1 AND table_name = ?2 AND id = ?3",
            params![scope, table.name(), sql_id(id)?],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(body) => parse_body(&body),
        None => Err(DbError::NotFound(format!("{table} row {id} in {scope}"))),
    }
}

pub fn exists(conn: &Connection, scope: &str, table: Table, id: Id) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM table_rows WHERE scope = ?1 AND table_name = ?2 AND id = ?3",
        params![scope, table.name(), sql_id(id)?],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a new row. A taken id is a constraint violation.
pub fn insert(conn: &Connection, scope: &str, table: Table, id: Id, body: &Value) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO table_rows (scope, table_name, id, body) VALUES (?1, ?2, ?3, ?4)",
        params![scope, table.name(), sql_id(id)?, body.to_string()],
    );
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(DbError::Constraint(format!(
                "{table} row {id} already exists in {scope}"
            )))
        }
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Insert or overwrite a row.
pub fn upsert(conn: &Connection, scope: &str, table: Table, id: Id, body: &Value) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO table_rows (scope, table_name, id, body) VALUES (?1, ?2, ?3, ?4)",
        params![scope, table.name(), sql_id(id)?, body.to_string()],
    )?;
    Ok(())
}

/// Overwrite an existing row.
pub fn update(conn: &Connection, scope: &str, table: Table, id: Id, body: &Value) -> Result<()> {
    let changed = conn.execute(
        "UPDATE table_rows SET body = ?4 WHERE scope = ?1 AND table_name = ?2 AND id = ?3",
        params![scope, table.name(), sql_id(id)?, body.to_string()],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("{table} row {id} in {scope}")));
    }
    Ok(())
}

pub fn delete(conn: &Connection, scope: &str, table: Table, id: Id) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM table_rows WHERE scope = ?1 AND table_name = ?2 AND id = ?3",
        params![scope, table.name(), sql_id(id)?],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("{table} row {id} in {scope}")));
    }
    Ok(())
}

/// Every scope holding at least one row of `table`, sorted.
pub fn scopes(conn: &Connection, table: Table) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT scope FROM table_rows WHERE table_name = ?1 ORDER BY scope",
    )?;
    let scopes = stmt
        .query_map([table.name()], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(scopes)
}
