//! # Transactions
//!
//! Explicit transaction handles shared by every store call of one
//! pricing operation.
//!
//! ## Connection Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Store method called with tx: Option<&SqliteTransaction>               │
//! │                                                                         │
//! │   tx = Some(handle) ──► lock handle ──► Conn::Shared                   │
//! │                         (statements of concurrent calls are            │
//! │                          serialized by the mutex; commit/rollback      │
//! │                          belong to whoever began the handle)           │
//! │                                                                         │
//! │   tx = None, read  ───► pool.acquire() ──► Conn::Pooled                │
//! │                                                                         │
//! │   tx = None, write ───► pool.begin()   ──► Conn::Local                 │
//! │                         (committed by the store on success,            │
//! │                          rolled back on drop otherwise)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A store method takes its connection once and threads
//! `&mut SqliteConnection` through its helpers. The mutex is not
//! reentrant.
//!
//! ## Savepoints
//! A multi-step operation running inside a transaction it does not own
//! marks a [`Savepoint`] first. On failure it rolls back to that mark, so
//! none of its writes survive a later commit by the owner.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

// =============================================================================
// Transaction Handle
// =============================================================================

/// An open SQLite transaction that can be shared between concurrent store
/// calls.
#[derive(Debug)]
pub struct SqliteTransaction {
    inner: Mutex<Transaction<'static, Sqlite>>,
    savepoints: AtomicU32,
}

/// A named mark inside an open [`SqliteTransaction`].
#[derive(Debug)]
pub struct Savepoint {
    name: String,
}

impl SqliteTransaction {
    fn new(tx: Transaction<'static, Sqlite>) -> Self {
        SqliteTransaction {
            inner: Mutex::new(tx),
            savepoints: AtomicU32::new(0),
        }
    }

    /// Marks the current state of the transaction.
    pub async fn savepoint(&self) -> DbResult<Savepoint> {
        let id = self.savepoints.fetch_add(1, Ordering::Relaxed);
        let savepoint = Savepoint {
            name: format!("pricing_sp_{id}"),
        };
        self.execute(&format!("SAVEPOINT {}", savepoint.name)).await?;
        Ok(savepoint)
    }

    /// Keeps everything written since `savepoint`.
    pub async fn release(&self, savepoint: Savepoint) -> DbResult<()> {
        self.execute(&format!("RELEASE SAVEPOINT {}", savepoint.name))
            .await
    }

    /// Discards everything written since `savepoint`. The transaction
    /// itself stays open.
    pub async fn rollback_to(&self, savepoint: Savepoint) -> DbResult<()> {
        // ROLLBACK TO keeps the savepoint on the stack
        self.execute(&format!("ROLLBACK TO SAVEPOINT {}", savepoint.name))
            .await?;
        self.execute(&format!("RELEASE SAVEPOINT {}", savepoint.name))
            .await
    }

    async fn execute(&self, sql: &str) -> DbResult<()> {
        let mut guard = self.lock().await;
        sqlx::raw_sql(sql)
            .execute(&mut **guard)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    async fn lock(&self) -> MutexGuard<'_, Transaction<'static, Sqlite>> {
        self.inner.lock().await
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.inner
            .into_inner()
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Rolls the transaction back.
    pub async fn rollback(self) -> DbResult<()> {
        self.inner
            .into_inner()
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

// =============================================================================
// Transaction Manager
// =============================================================================

/// Opens and closes transactions for the pricing service.
pub trait TransactionManager {
    /// Handle passed to stores as `Option<&Self::Tx>`.
    type Tx;

    /// Mark inside an open transaction.
    type Savepoint;

    async fn begin(&self) -> DbResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> DbResult<()>;

    async fn rollback(&self, tx: Self::Tx) -> DbResult<()>;

    async fn savepoint(&self, tx: &Self::Tx) -> DbResult<Self::Savepoint>;

    async fn release_savepoint(&self, tx: &Self::Tx, savepoint: Self::Savepoint) -> DbResult<()>;

    /// Undoes every write made in `tx` since `savepoint` was taken.
    async fn rollback_to_savepoint(
        &self,
        tx: &Self::Tx,
        savepoint: Self::Savepoint,
    ) -> DbResult<()>;
}

impl TransactionManager for Database {
    type Tx = SqliteTransaction;
    type Savepoint = Savepoint;

    async fn begin(&self) -> DbResult<SqliteTransaction> {
        let tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction opened");
        Ok(SqliteTransaction::new(tx))
    }

    async fn commit(&self, tx: SqliteTransaction) -> DbResult<()> {
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&self, tx: SqliteTransaction) -> DbResult<()> {
        tx.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    async fn savepoint(&self, tx: &SqliteTransaction) -> DbResult<Savepoint> {
        let savepoint = tx.savepoint().await?;
        debug!(savepoint = %savepoint.name, "Savepoint set");
        Ok(savepoint)
    }

    async fn release_savepoint(&self, tx: &SqliteTransaction, savepoint: Savepoint) -> DbResult<()> {
        tx.release(savepoint).await
    }

    async fn rollback_to_savepoint(
        &self,
        tx: &SqliteTransaction,
        savepoint: Savepoint,
    ) -> DbResult<()> {
        let name = savepoint.name.clone();
        tx.rollback_to(savepoint).await?;
        debug!(savepoint = %name, "Rolled back to savepoint");
        Ok(())
    }
}

// =============================================================================
// Connection Selection
// =============================================================================

/// The connection a single store call runs on.
pub(crate) enum Conn<'a> {
    Pooled(PoolConnection<Sqlite>),
    Local(Transaction<'static, Sqlite>),
    Shared(MutexGuard<'a, Transaction<'static, Sqlite>>),
}

impl<'a> Conn<'a> {
    /// Connection for a read: the caller's transaction, or a pooled
    /// connection.
    pub(crate) async fn read(
        pool: &SqlitePool,
        tx: Option<&'a SqliteTransaction>,
    ) -> DbResult<Conn<'a>> {
        match tx {
            Some(tx) => Ok(Conn::Shared(tx.lock().await)),
            None => Ok(Conn::Pooled(pool.acquire().await?)),
        }
    }

    /// Connection for a write: the caller's transaction, or a fresh one
    /// that [`Conn::finish`] commits.
    pub(crate) async fn write(
        pool: &SqlitePool,
        tx: Option<&'a SqliteTransaction>,
    ) -> DbResult<Conn<'a>> {
        match tx {
            Some(tx) => Ok(Conn::Shared(tx.lock().await)),
            None => pool
                .begin()
                .await
                .map(Conn::Local)
                .map_err(|e| DbError::TransactionFailed(e.to_string())),
        }
    }

    /// Commits a local transaction. Shared and pooled connections are
    /// released untouched.
    pub(crate) async fn finish(self) -> DbResult<()> {
        if let Conn::Local(tx) = self {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Deref for Conn<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        match self {
            Conn::Pooled(conn) => &**conn,
            Conn::Local(tx) => &**tx,
            Conn::Shared(guard) => &***guard,
        }
    }
}

impl DerefMut for Conn<'_> {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        match self {
            Conn::Pooled(conn) => &mut **conn,
            Conn::Local(tx) => &mut **tx,
            Conn::Shared(guard) => &mut ***guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    async fn count_currencies(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM currency")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn insert_usd(tx: &SqliteTransaction) {
        let mut guard = tx.lock().await;
        sqlx::query(
            "INSERT INTO currency (code, name, symbol, decimal_digits) VALUES ('usd', 'US Dollar', '$', 2)",
        )
        .execute(&mut **guard)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_commit_persists_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tx = db.begin().await.unwrap();
        insert_usd(&tx).await;
        db.commit(tx).await.unwrap();

        assert_eq!(count_currencies(&db).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tx = db.begin().await.unwrap();
        insert_usd(&tx).await;
        db.rollback(tx).await.unwrap();

        assert_eq!(count_currencies(&db).await, 0);
    }

    async fn insert_eur(tx: &SqliteTransaction) {
        let mut guard = tx.lock().await;
        sqlx::query(
            "INSERT INTO currency (code, name, symbol, decimal_digits) VALUES ('eur', 'Euro', '€', 2)",
        )
        .execute(&mut **guard)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_rollback_to_savepoint_keeps_earlier_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tx = db.begin().await.unwrap();
        insert_usd(&tx).await;
        let savepoint = db.savepoint(&tx).await.unwrap();
        insert_eur(&tx).await;
        db.rollback_to_savepoint(&tx, savepoint).await.unwrap();
        db.commit(tx).await.unwrap();

        let codes: Vec<String> = sqlx::query_scalar("SELECT code FROM currency")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(codes, vec!["usd".to_string()]);
    }

    #[tokio::test]
    async fn test_released_savepoint_commits_with_transaction() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let tx = db.begin().await.unwrap();
        let outer = db.savepoint(&tx).await.unwrap();
        insert_usd(&tx).await;
        let inner = db.savepoint(&tx).await.unwrap();
        insert_eur(&tx).await;
        db.release_savepoint(&tx, inner).await.unwrap();
        db.release_savepoint(&tx, outer).await.unwrap();
        db.commit(tx).await.unwrap();

        assert_eq!(count_currencies(&db).await, 2);
    }
}
