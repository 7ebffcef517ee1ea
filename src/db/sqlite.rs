use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use super::DatabaseError;
use crate::config::DatabaseConfig;

const SCHEMA_SQL: &str = include_str!("../../resources/schema.sql");

/// Open a connection for `config`, apply pragmas and (if configured) the schema.
pub fn open_database(config: &DatabaseConfig) -> Result<Connection, DatabaseError> {
    let open_err = |source: rusqlite::Error| DatabaseError::Open {
        target: config.target(),
        source,
    };

    let conn = if config.is_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open(config.database_path())
    }
    .map_err(open_err)?;

    apply_key(&conn, &config.password).map_err(open_err)?;
    configure_pragmas(&conn, config.busy_timeout_ms).map_err(open_err)?;
    register_functions(&conn).map_err(open_err)?;

    if config.bootstrap_schema {
        ensure_schema(&conn)?;
    }
    Ok(conn)
}

/// Open an in-memory database with the full schema (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    open_database(&DatabaseConfig::in_memory())
}

fn configure_pragmas(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
}

/// `fold(text)`: Unicode lowercase, for case-insensitive matching beyond
/// ASCII (SQLite's own `LOWER` and `LIKE` only fold A-Z).
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

#[cfg(feature = "sqlcipher")]
fn apply_key(conn: &Connection, password: &str) -> rusqlite::Result<()> {
    if password.is_empty() {
        return Ok(());
    }
    conn.pragma_update(None, "key", password)
}

#[cfg(not(feature = "sqlcipher"))]
fn apply_key(_conn: &Connection, password: &str) -> rusqlite::Result<()> {
    if !password.is_empty() {
        tracing::debug!("database.password ignored: built without the sqlcipher feature");
    }
    Ok(())
}

/// Create the record tables if they do not exist yet.
pub fn ensure_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| DatabaseError::SchemaFailed(e.to_string()))?;
    tracing::debug!("Record schema ensured");
    Ok(())
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}
