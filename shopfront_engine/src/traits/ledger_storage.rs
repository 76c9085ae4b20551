use thiserror::Error;

use crate::db_types::{PaidTransaction, PidxCreated, TransactionLedger};

/// The per-user transaction ledger. Entries are append-only; nothing here mutates or removes.
#[allow(async_fn_in_trait)]
pub trait LedgerStorage: Clone {
    /// Records an initiated payment attempt. Called strictly after a successful gateway response.
    async fn append_pidx_created(&self, user_id: i64, entry: PidxCreated) -> Result<(), LedgerError>;

    /// Records a completed payment, unless an entry for the same pidx already exists. Returns
    /// `true` if the entry was appended, `false` if the pidx was already present. The check and
    /// the append are atomic (unique index on pidx).
    async fn append_paid_transaction(&self, user_id: i64, entry: PaidTransaction) -> Result<bool, LedgerError>;

    async fn fetch_ledger(&self, user_id: i64) -> Result<TransactionLedger, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
