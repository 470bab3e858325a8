//! Runs a unit of work inside one transaction on a freshly acquired connection.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::error::{DataAccessError, DbError, DbResult};
use super::storage::ConnectionProvider;

/// Acquire a connection, begin a transaction and run `work` against it.
///
/// `Ok` commits and returns the value. `Err` rolls back and is returned as
/// [`DataAccessError::Operation`] carrying the original failure; a rollback
/// failure is only logged. The connection is released on every path when
/// its handle drops.
pub fn run_in_transaction<P, T, F>(
    provider: &P,
    operation: &'static str,
    work: F,
) -> Result<T, DataAccessError>
where
    P: ConnectionProvider + ?Sized,
    F: FnOnce(&Connection) -> DbResult<T>,
{
    let mut handle = provider.acquire().map_err(DataAccessError::Acquire)?;
    let fail = |source: DbError| DataAccessError::Operation { operation, source };

    // IMMEDIATE takes the write lock up front so concurrent writers wait on
    // the busy timeout rather than fail on lock upgrade
    let tx = Transaction::new(&mut handle, TransactionBehavior::Immediate)
        .map_err(|e| fail(e.into()))?;
    tracing::debug!(operation, "transaction started");

    match work(&tx) {
        Ok(value) => {
            tx.commit().map_err(|e| fail(e.into()))?;
            tracing::debug!(operation, "transaction committed");
            Ok(value)
        }
        Err(cause) => {
            match tx.rollback() {
                Ok(()) => tracing::debug!(operation, error = %cause, "transaction rolled back"),
                Err(rollback_err) => tracing::warn!(
                    operation,
                    error = %cause,
                    rollback_error = %rollback_err,
                    "rollback failed"
                ),
            }
            Err(fail(cause))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::{Deref, DerefMut};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::data::storage::{ensure_schema, SqliteConnection, SqliteProvider};

    /// Counts acquisitions and releases around a real provider
    struct CountingProvider {
        inner: SqliteProvider,
        acquired: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    struct CountedHandle {
        conn: SqliteConnection,
        released: Arc<AtomicUsize>,
    }

    impl Deref for CountedHandle {
        type Target = Connection;
        fn deref(&self) -> &Connection {
            &self.conn
        }
    }

    impl DerefMut for CountedHandle {
        fn deref_mut(&mut self) -> &mut Connection {
            &mut self.conn
        }
    }

    impl Drop for CountedHandle {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ConnectionProvider for CountingProvider {
        type Handle = CountedHandle;

        fn acquire(&self) -> rusqlite::Result<CountedHandle> {
            let conn = self.inner.acquire()?;
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(CountedHandle {
                conn,
                released: Arc::clone(&self.released),
            })
        }
    }

    fn counting_provider() -> (CountingProvider, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let inner = SqliteProvider::new(dir.path().join("tx.db"), Duration::from_secs(5));
        ensure_schema(&inner.acquire().unwrap()).unwrap();
        let provider = CountingProvider {
            inner,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        };
        (provider, dir)
    }

    fn project_count(provider: &CountingProvider) -> i64 {
        provider
            .inner
            .acquire()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM project", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_success_releases_once() {
        let (provider, _dir) = counting_provider();
        let id = run_in_transaction(&provider, "insert", |conn| {
            conn.execute("INSERT INTO project (project_name) VALUES ('A')", [])?;
            Ok(conn.last_insert_rowid())
        })
        .unwrap();

        assert_eq!(id, 1);
        assert_eq!(project_count(&provider), 1);
        assert_eq!(provider.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_forced_failure_rolls_back_insert() {
        let (provider, _dir) = counting_provider();
        let err = run_in_transaction(&provider, "insert then abort", |conn| -> DbResult<()> {
            conn.execute("INSERT INTO project (project_name) VALUES ('Doomed')", [])?;
            Err(DbError::Aborted("forced failure".to_string()))
        })
        .unwrap_err();

        assert!(matches!(
            err,
            DataAccessError::Operation {
                operation: "insert then abort",
                source: DbError::Aborted(_)
            }
        ));
        assert_eq!(project_count(&provider), 0);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_statement_error_rolls_back_earlier_writes() {
        let (provider, _dir) = counting_provider();
        let err = run_in_transaction(&provider, "multi write", |conn| {
            conn.execute("INSERT INTO project (project_name) VALUES ('First')", [])?;
            conn.execute("INSERT INTO project (project_name) VALUES ('Second')", [])?;
            // NOT NULL violation on the third write
            conn.execute("INSERT INTO project (project_name) VALUES (NULL)", [])?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err.cause(), Some(DbError::Sql(_))));
        assert_eq!(project_count(&provider), 0);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_rollback_keeps_original_cause() {
        let (provider, _dir) = counting_provider();
        let err = run_in_transaction(&provider, "rollback twice", |conn| -> DbResult<()> {
            conn.execute("INSERT INTO project (project_name) VALUES ('Orphan')", [])?;
            // Ends the transaction early so the wrapper's own rollback fails
            conn.execute_batch("ROLLBACK")?;
            Err(DbError::Aborted("original".to_string()))
        })
        .unwrap_err();

        match err {
            DataAccessError::Operation {
                operation,
                source: DbError::Aborted(reason),
            } => {
                assert_eq!(operation, "rollback twice");
                assert_eq!(reason, "original");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(project_count(&provider), 0);
        assert_eq!(provider.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(provider.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_acquire_failure_is_reported_without_work() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(
            dir.path().join("nope").join("tx.db"),
            Duration::from_secs(1),
        );
        let mut ran = false;
        let err = run_in_transaction(&provider, "never", |_| {
            ran = true;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, DataAccessError::Acquire(_)));
        assert!(!ran);
    }
}
