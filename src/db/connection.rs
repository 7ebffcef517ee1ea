//! One shared, self-healing database handle per database.
//!
//! Every `get_connection()` call validates the current handle before giving
//! it out: a closed handle is reopened, and a handle that fails the probe,
//! was left inside a transaction, or whose lock was poisoned by a panicking
//! caller is rolled back (best effort) and replaced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use super::{open_database, DatabaseError};
use crate::config::DatabaseConfig;

/// Handle shared between all callers of one [`ConnectionManager`].
pub type SharedConnection = Arc<DbHandle>;

/// A database connection plus the lock that serializes its callers.
pub struct DbHandle {
    generation: u64,
    conn: Mutex<Option<Connection>>,
}

impl DbHandle {
    fn new(generation: u64, conn: Connection) -> Self {
        Self {
            generation,
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Sequence number of this handle within its manager (1 for the first open).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `f` against the connection while holding the handle's lock.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let conn = guard.as_ref().ok_or(DatabaseError::ConnectionUnavailable)?;
        f(conn)
    }

    /// Whether the handle has been closed. A poisoned handle is not closed,
    /// it is broken; see [`ConnectionManager::get_connection`].
    pub fn is_closed(&self) -> bool {
        self.lock_ignoring_poison().is_none()
    }

    /// Close the underlying connection. Later `with_conn` calls fail with
    /// [`DatabaseError::ConnectionUnavailable`].
    pub fn close(&self) -> Result<(), DatabaseError> {
        let taken = self.lock_ignoring_poison().take();
        match taken {
            Some(conn) => conn.close().map_err(|(_, e)| DatabaseError::from(e)),
            None => Ok(()),
        }
    }

    fn lock_ignoring_poison(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Roll back whatever the connection was doing and drop it.
    fn discard(&self) {
        let Some(conn) = self.lock_ignoring_poison().take() else {
            return;
        };
        if !conn.is_autocommit() {
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                tracing::debug!(generation = self.generation, error = %e, "Rollback before reopen failed");
            }
        }
        if let Err((_, e)) = conn.close() {
            tracing::debug!(generation = self.generation, error = %e, "Close before reopen failed");
        }
    }
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Result of validating the current handle.
#[derive(Debug, PartialEq, Eq)]
enum Health {
    Missing,
    Healthy,
    Closed,
    Broken(String),
}

fn check_health(handle: &DbHandle) -> Health {
    let guard = match handle.conn.lock() {
        Ok(guard) => guard,
        Err(_) => return Health::Broken("connection lock poisoned".into()),
    };
    let Some(conn) = guard.as_ref() else {
        return Health::Closed;
    };
    if let Err(e) = conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        return Health::Broken(format!("probe failed: {e}"));
    }
    if !conn.is_autocommit() {
        return Health::Broken("transaction left open".into());
    }
    Health::Healthy
}

/// Owns the single shared connection for one database.
///
/// Create one per process at the composition root and pass it (or the
/// handles it returns) to whatever needs the store.
pub struct ConnectionManager {
    config: DatabaseConfig,
    current: Mutex<Option<SharedConnection>>,
    opened: AtomicU64,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
            opened: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Number of connections opened so far (successful opens only).
    pub fn open_count(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Return a validated connection, opening or reopening as needed.
    ///
    /// `None` means the database could not be opened; the cause has been
    /// logged. A healthy handle is returned as-is, so repeated calls hand out
    /// the same `Arc` until something breaks it.
    pub fn get_connection(&self) -> Option<SharedConnection> {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        let health = slot.as_deref().map_or(Health::Missing, check_health);
        match health {
            Health::Healthy => return slot.clone(),
            Health::Missing => {}
            Health::Closed => {
                tracing::info!(target_db = %self.config.target(), "Connection closed, reopening");
            }
            Health::Broken(reason) => {
                tracing::warn!(target_db = %self.config.target(), %reason, "Connection unusable, rolling back and reopening");
                if let Some(old) = slot.as_deref() {
                    old.discard();
                }
            }
        }

        *slot = self.open_handle();
        slot.clone()
    }

    /// Close the current handle, if any. The next `get_connection()` reopens.
    pub fn close(&self) {
        let taken = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = taken {
            if let Err(e) = handle.close() {
                tracing::warn!(generation = handle.generation(), error = %e, "Error closing connection");
            }
        }
    }

    fn open_handle(&self) -> Option<SharedConnection> {
        match open_database(&self.config) {
            Ok(conn) => {
                let generation = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!(target_db = %self.config.target(), generation, "Database connection opened");
                Some(Arc::new(DbHandle::new(generation, conn)))
            }
            Err(e) => {
                tracing::error!(target_db = %self.config.target(), error = %e, "Database connection failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("target", &self.config.target())
            .field("opened", &self.open_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn file_manager(dir: &Path) -> ConnectionManager {
        ConnectionManager::new(DatabaseConfig::at_path(&dir.join("records.db")))
    }

    fn patient_count(handle: &DbHandle) -> i64 {
        handle
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM Patient", [], |row| row.get(0))
                    .map_err(DatabaseError::from)
            })
            .unwrap()
    }

    #[test]
    fn first_call_opens() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());
        assert_eq!(manager.open_count(), 0);

        let handle = manager.get_connection().unwrap();
        assert_eq!(handle.generation(), 1);
        assert_eq!(manager.open_count(), 1);
        assert!(!handle.is_closed());
    }

    #[test]
    fn healthy_handle_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let a = manager.get_connection().unwrap();
        let b = manager.get_connection().unwrap();
        let c = manager.get_connection().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(manager.open_count(), 1);
    }

    #[test]
    fn closed_handle_is_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let old = manager.get_connection().unwrap();
        old.close().unwrap();
        assert!(old.is_closed());

        let new = manager.get_connection().unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.generation(), 2);
        assert!(matches!(
            old.with_conn(|_| Ok(())),
            Err(DatabaseError::ConnectionUnavailable)
        ));
    }

    #[test]
    fn manager_close_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let old = manager.get_connection().unwrap();
        manager.close();
        assert!(old.is_closed());

        let new = manager.get_connection().unwrap();
        assert_eq!(new.generation(), 2);
    }

    #[test]
    fn open_transaction_is_rolled_back_and_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let old = manager.get_connection().unwrap();
        old.with_conn(|conn| {
            conn.execute_batch("BEGIN; INSERT INTO Patient (Name, Age) VALUES ('Ghost', 1);")?;
            Ok(())
        })
        .unwrap();

        let new = manager.get_connection().unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(old.is_closed());
        // Uncommitted work on the old handle is gone
        assert_eq!(patient_count(&new), 0);
        let autocommit = new.with_conn(|conn| Ok(conn.is_autocommit())).unwrap();
        assert!(autocommit);
    }

    #[test]
    fn poisoned_handle_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let old = manager.get_connection().unwrap();
        let clone = Arc::clone(&old);
        let joined = std::thread::spawn(move || {
            let _ = clone.with_conn(|_| -> Result<(), DatabaseError> {
                panic!("caller panicked mid-operation");
            });
        })
        .join();
        assert!(joined.is_err());
        assert!(matches!(
            old.with_conn(|_| Ok(())),
            Err(DatabaseError::LockPoisoned)
        ));

        let new = manager.get_connection().unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(patient_count(&new), 0);
    }

    #[test]
    fn committed_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let manager = file_manager(dir.path());

        let first = manager.get_connection().unwrap();
        first
            .with_conn(|conn| {
                conn.execute("INSERT INTO Patient (Name, Age) VALUES ('Ada', 36)", [])?;
                Ok(())
            })
            .unwrap();
        first.close().unwrap();

        let second = manager.get_connection().unwrap();
        assert_eq!(patient_count(&second), 1);
    }

    #[test]
    fn open_failure_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::at_path(&dir.path().join("no-such-dir").join("records.db"));
        let manager = ConnectionManager::new(config);

        assert!(manager.get_connection().is_none());
        assert!(manager.get_connection().is_none());
        assert_eq!(manager.open_count(), 0);
    }

    #[test]
    fn health_states() {
        let conn = open_database(&DatabaseConfig::in_memory()).unwrap();
        let handle = DbHandle::new(1, conn);
        assert_eq!(check_health(&handle), Health::Healthy);

        handle
            .with_conn(|conn| conn.execute_batch("BEGIN").map_err(DatabaseError::from))
            .unwrap();
        assert!(matches!(check_health(&handle), Health::Broken(_)));

        handle.discard();
        assert_eq!(check_health(&handle), Health::Closed);
    }

    #[test]
    fn concurrent_callers_share_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(file_manager(dir.path()));
        let first = manager.get_connection().unwrap();

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let handle = manager.get_connection().unwrap();
                    handle
                        .with_conn(|conn| {
                            conn.execute(
                                "INSERT INTO Patient (Name, Age) VALUES (?1, ?2)",
                                rusqlite::params![format!("P{i}"), i],
                            )?;
                            Ok(())
                        })
                        .unwrap();
                    handle
                })
            })
            .collect();

        for worker in workers {
            let handle = worker.join().unwrap();
            assert!(Arc::ptr_eq(&handle, &first));
        }
        assert_eq!(patient_count(&first), 8);
        assert_eq!(manager.open_count(), 1);
    }
}
