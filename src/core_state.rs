//! Application state owned by the composition root.
//!
//! `CoreState` holds the one `ConnectionManager` for the process. Adapters
//! (the CLI today) call `open_db()` once per interaction and hand the
//! returned handle to a single record operation.

use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::db::{self, ConnectionManager, DatabaseError, SharedConnection};

pub struct CoreState {
    connections: ConnectionManager,
}

impl CoreState {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            connections: ConnectionManager::new(config),
        }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Get a validated connection for one interaction.
    ///
    /// An absent connection is the "service unavailable" state; the cause
    /// was already logged by the manager.
    pub fn open_db(&self) -> Result<SharedConnection, CoreError> {
        self.connections
            .get_connection()
            .ok_or(CoreError::ConnectionFailed)
    }

    /// Create the record tables on the current connection if missing.
    pub fn init_schema(&self) -> Result<(), CoreError> {
        let conn = self.open_db()?;
        conn.with_conn(db::ensure_schema)?;
        Ok(())
    }

    /// Close the shared connection (end of process or explicit reset).
    pub fn shutdown(&self) {
        self.connections.close();
        tracing::debug!("Connection manager shut down");
    }
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database connection failed")]
    ConnectionFailed,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
