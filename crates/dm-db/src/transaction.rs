//! Scoped transactions.
//!
//! A [`Transaction`] begins on creation and rolls back on drop unless
//! [`Transaction::commit`] was called, so every exit path (early return,
//! `?`, panic) releases it.

use crate::error::{DbError, DbResult};
use crate::traits::DatabaseCore;

/// Guard over an open transaction.
pub struct Transaction<'a, D: DatabaseCore + ?Sized> {
    db: &'a D,
    finished: bool,
}

impl<'a, D: DatabaseCore + ?Sized> Transaction<'a, D> {
    /// Begin a transaction on `db`
    pub fn begin(db: &'a D) -> DbResult<Self> {
        db.begin()
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;
        Ok(Self {
            db,
            finished: false,
        })
    }

    /// Database the transaction runs on
    pub fn db(&self) -> &'a D {
        self.db
    }

    /// Commit, rolling back if the commit itself fails
    pub fn commit(mut self) -> DbResult<()> {
        self.finished = true;
        if let Err(commit_err) = self.db.commit() {
            let _ = self.db.rollback();
            return Err(DbError::TransactionError(format!(
                "COMMIT failed: {commit_err}"
            )));
        }
        Ok(())
    }
}

impl<D: DatabaseCore + ?Sized> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.db.rollback() {
                log::warn!("Rollback of abandoned transaction failed: {e}");
            }
        }
    }
}

#[cfg(test)]
#[path = "transaction_test.rs"]
mod tests;
