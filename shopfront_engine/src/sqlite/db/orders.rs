use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        NewOrder, Order, OrderId, OrderStatusType, PaymentStatusType, TrackingEvent,
    },
    traits::OrderApiError,
};

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    customer_id: i64,
    status: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    items: String,
    summary: String,
    shipping: String,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Inflates the row into a full order. The JSON columns were serialized by us at insert time,
    /// so a parse failure indicates data corruption and surfaces as a database error.
    fn into_order(self, tracking: Vec<TrackingEvent>) -> Result<Order, OrderApiError> {
        let items = serde_json::from_str(&self.items)
            .map_err(|e| OrderApiError::DatabaseError(format!("Corrupt items column on order {}: {e}", self.order_number)))?;
        let summary = serde_json::from_str(&self.summary)
            .map_err(|e| OrderApiError::DatabaseError(format!("Corrupt summary column on order {}: {e}", self.order_number)))?;
        let shipping = serde_json::from_str(&self.shipping)
            .map_err(|e| OrderApiError::DatabaseError(format!("Corrupt shipping column on order {}: {e}", self.order_number)))?;
        Ok(Order {
            id: self.id,
            order_number: OrderId(self.order_number),
            customer_id: self.customer_id,
            status: OrderStatusType::from(self.status),
            payment_method: self.payment_method.into(),
            payment_status: PaymentStatusType::from(self.payment_status),
            transaction_id: self.transaction_id,
            paid_at: self.paid_at,
            items,
            summary,
            shipping,
            tracking,
            notes: self.notes,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct TrackingRow {
    status: String,
    timestamp: DateTime<Utc>,
    actor: String,
    location: Option<String>,
    description: Option<String>,
}

impl From<TrackingRow> for TrackingEvent {
    fn from(row: TrackingRow) -> Self {
        TrackingEvent {
            status: OrderStatusType::from(row.status),
            timestamp: row.timestamp,
            actor: row.actor,
            location: row.location,
            description: row.description,
        }
    }
}

/// Inserts a new order (status `PENDING_PAYMENT`, payment status `PENDING`, version 1) and the
/// first tracking entry. The unique constraint on `order_number` converts a collision into
/// [`OrderApiError::OrderAlreadyExists`].
pub async fn insert_order(
    order: NewOrder,
    initial_event: TrackingEvent,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let items = serde_json::to_string(&order.items)
        .map_err(|e| OrderApiError::OrderCreationFailed(format!("Could not serialize order items: {e}")))?;
    let summary = serde_json::to_string(&order.summary)
        .map_err(|e| OrderApiError::OrderCreationFailed(format!("Could not serialize order summary: {e}")))?;
    let shipping = serde_json::to_string(&order.shipping)
        .map_err(|e| OrderApiError::OrderCreationFailed(format!("Could not serialize shipping details: {e}")))?;
    let result = sqlx::query(
        r#"
            INSERT INTO orders (
                order_number, customer_id, status, payment_method, payment_status,
                items, summary, shipping, notes, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1, $10, $10)
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(order.customer_id)
    .bind(OrderStatusType::PendingPayment.to_string())
    .bind(order.payment_method.to_string())
    .bind(PaymentStatusType::Pending.to_string())
    .bind(items)
    .bind(summary)
    .bind(shipping)
    .bind(order.notes.clone())
    .bind(order.created_at)
    .execute(&mut *conn)
    .await;
    if let Err(e) = result {
        if e.as_database_error().map(|db| db.is_unique_violation()).unwrap_or(false) {
            return Err(OrderApiError::OrderAlreadyExists(order.order_number));
        }
        return Err(e.into());
    }
    insert_tracking_event(&order.order_number, initial_event, &mut *conn).await?;
    debug!("🗃️ Order [{}] inserted for customer {}", order.order_number, order.customer_id);
    fetch_order_by_number(&order.order_number, conn)
        .await?
        .ok_or_else(|| OrderApiError::OrderCreationFailed(format!("Order {} vanished after insert", order.order_number)))
}

pub async fn fetch_order_by_number(
    order_number: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderApiError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => {
            let tracking = fetch_tracking(order_number, conn).await?;
            Ok(Some(row.into_order(tracking)?))
        },
        None => Ok(None),
    }
}

pub async fn fetch_orders_for_customer(customer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderApiError> {
    let rows: Vec<OrderRow> =
        sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(customer_id)
            .fetch_all(&mut *conn)
            .await?;
    inflate_rows(rows, conn).await
}

pub async fn fetch_orders(skip: i64, limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderApiError> {
    let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *conn)
        .await?;
    inflate_rows(rows, conn).await
}

async fn inflate_rows(rows: Vec<OrderRow>, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderApiError> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let tracking = fetch_tracking(&OrderId(row.order_number.clone()), &mut *conn).await?;
        orders.push(row.into_order(tracking)?);
    }
    Ok(orders)
}

async fn fetch_tracking(order_number: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<TrackingEvent>, OrderApiError> {
    let rows: Vec<TrackingRow> = sqlx::query_as(
        "SELECT status, timestamp, actor, location, description FROM order_tracking WHERE order_number = $1 ORDER BY id",
    )
    .bind(order_number.as_str())
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(TrackingEvent::from).collect())
}

async fn insert_tracking_event(
    order_number: &OrderId,
    event: TrackingEvent,
    conn: &mut SqliteConnection,
) -> Result<(), OrderApiError> {
    sqlx::query(
        r#"
            INSERT INTO order_tracking (order_number, status, timestamp, actor, location, description)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order_number.as_str())
    .bind(event.status.to_string())
    .bind(event.timestamp)
    .bind(event.actor)
    .bind(event.location)
    .bind(event.description)
    .execute(conn)
    .await?;
    Ok(())
}

/// Compare-and-swap status update. The UPDATE is conditional on `expected_version`; zero affected
/// rows means either the order is gone or someone got in first, and we fetch to tell the two
/// apart.
pub async fn update_order_status(
    order_number: &OrderId,
    new_status: OrderStatusType,
    event: TrackingEvent,
    expected_version: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = $1, version = version + 1, updated_at = $2
            WHERE order_number = $3 AND version = $4
        "#,
    )
    .bind(new_status.to_string())
    .bind(Utc::now())
    .bind(order_number.as_str())
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(conflict_or_missing(order_number, expected_version, conn).await?);
    }
    insert_tracking_event(order_number, event, &mut *conn).await?;
    fetch_order_by_number(order_number, conn)
        .await?
        .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))
}

/// Compare-and-swap payment status update. `transaction_id` and `paid_at` only overwrite the
/// stored values when provided.
pub async fn update_payment_status(
    order_number: &OrderId,
    new_status: PaymentStatusType,
    transaction_id: Option<&str>,
    paid_at: Option<DateTime<Utc>>,
    expected_version: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderApiError> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET payment_status = $1,
                transaction_id = COALESCE($2, transaction_id),
                paid_at = COALESCE($3, paid_at),
                version = version + 1,
                updated_at = $4
            WHERE order_number = $5 AND version = $6
        "#,
    )
    .bind(new_status.to_string())
    .bind(transaction_id)
    .bind(paid_at)
    .bind(Utc::now())
    .bind(order_number.as_str())
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(conflict_or_missing(order_number, expected_version, conn).await?);
    }
    fetch_order_by_number(order_number, conn)
        .await?
        .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))
}

async fn conflict_or_missing(
    order_number: &OrderId,
    expected_version: i64,
    conn: &mut SqliteConnection,
) -> Result<OrderApiError, OrderApiError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(match exists {
        Some(_) => OrderApiError::VersionConflict { order_number: order_number.clone(), expected_version },
        None => OrderApiError::OrderNotFound(order_number.clone()),
    })
}
