use chrono::{DateTime, Utc};
use log::debug;
use shopfront_common::Money;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{OrderId, PaidTransaction, PidxCreated, TransactionLedger},
    traits::LedgerError,
};

#[derive(Debug, Clone, FromRow)]
struct PidxCreatedRow {
    pidx: String,
    order_number: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct PaidTransactionRow {
    pidx: String,
    order_number: String,
    amount: Money,
    breakdown: String,
    created_at: DateTime<Utc>,
}

pub async fn append_pidx_created(user_id: i64, entry: PidxCreated, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    sqlx::query(
        r#"
            INSERT INTO ledger_pidx_created (user_id, pidx, order_number, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(entry.pidx)
    .bind(entry.order_number.as_str())
    .bind(entry.description)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Records a completed payment, unless the pidx has been recorded before. The unique index on
/// pidx makes this a single atomic check-and-append; `false` means the entry was already there.
pub async fn append_paid_transaction(
    user_id: i64,
    entry: PaidTransaction,
    conn: &mut SqliteConnection,
) -> Result<bool, LedgerError> {
    let breakdown = serde_json::to_string(&entry.breakdown)
        .map_err(|e| LedgerError::DatabaseError(format!("Could not serialize breakdown for {}: {e}", entry.pidx)))?;
    let result = sqlx::query(
        r#"
            INSERT OR IGNORE INTO ledger_paid_transactions (user_id, pidx, order_number, amount, breakdown, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(entry.pidx.clone())
    .bind(entry.order_number.as_str())
    .bind(entry.amount)
    .bind(breakdown)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    let appended = result.rows_affected() > 0;
    if appended {
        debug!("🗃️ Recorded completed payment {} for order {}", entry.pidx, entry.order_number);
    }
    Ok(appended)
}

pub async fn fetch_ledger(user_id: i64, conn: &mut SqliteConnection) -> Result<TransactionLedger, LedgerError> {
    let created: Vec<PidxCreatedRow> = sqlx::query_as(
        "SELECT pidx, order_number, description, created_at FROM ledger_pidx_created WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    let paid: Vec<PaidTransactionRow> = sqlx::query_as(
        "SELECT pidx, order_number, amount, breakdown, created_at FROM ledger_paid_transactions WHERE user_id = $1 \
         ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    let pidx_created = created
        .into_iter()
        .map(|row| PidxCreated {
            pidx: row.pidx,
            order_number: OrderId(row.order_number),
            description: row.description,
            created_at: row.created_at,
        })
        .collect();
    let mut paid_transactions = Vec::with_capacity(paid.len());
    for row in paid {
        let breakdown = serde_json::from_str(&row.breakdown)
            .map_err(|e| LedgerError::DatabaseError(format!("Corrupt breakdown column for {}: {e}", row.pidx)))?;
        paid_transactions.push(PaidTransaction {
            pidx: row.pidx,
            order_number: OrderId(row.order_number),
            amount: row.amount,
            breakdown,
            created_at: row.created_at,
        });
    }
    Ok(TransactionLedger { user_id, pidx_created, paid_transactions })
}
