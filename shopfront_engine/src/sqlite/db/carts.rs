use chrono::{DateTime, Utc};
use log::trace;
use shopfront_common::Money;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Cart, LineItem, OrderSummary},
    traits::CartApiError,
};

#[derive(Debug, Clone, FromRow)]
struct CartItemRow {
    id: String,
    product_id: i64,
    name: String,
    quantity: i64,
    unit_price: Money,
    total_price: Money,
    image_url: Option<String>,
    discount_percent: Option<i64>,
    last_modified: DateTime<Utc>,
}

impl From<CartItemRow> for LineItem {
    fn from(row: CartItemRow) -> Self {
        LineItem {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            image_url: row.image_url,
            discount_percent: row.discount_percent,
            last_modified: row.last_modified,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct SummaryRow {
    subtotal: Money,
    discount: Money,
    shipping: Money,
    tax: Money,
    total: Money,
}

impl From<SummaryRow> for OrderSummary {
    fn from(row: SummaryRow) -> Self {
        OrderSummary {
            subtotal: row.subtotal,
            discount: row.discount,
            shipping: row.shipping,
            tax: row.tax,
            total: row.total,
        }
    }
}

/// Fetches the user's cart, lazily creating the (empty) summary row on first access.
pub async fn fetch_or_create_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Cart, CartApiError> {
    let rows: Vec<CartItemRow> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY last_modified")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    let summary: Option<SummaryRow> =
        sqlx::query_as("SELECT subtotal, discount, shipping, tax, total FROM cart_summaries WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let summary = match summary {
        Some(row) => row.into(),
        None => {
            trace!("🗃️ Creating cart for user {user_id}");
            sqlx::query("INSERT OR IGNORE INTO cart_summaries (user_id) VALUES ($1)")
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
            OrderSummary::default()
        },
    };
    Ok(Cart { user_id, items: rows.into_iter().map(LineItem::from).collect(), summary })
}

pub async fn insert_line_item(user_id: i64, item: LineItem, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (
                id, user_id, product_id, name, quantity, unit_price, total_price,
                image_url, discount_percent, last_modified
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(item.id)
    .bind(user_id)
    .bind(item.product_id)
    .bind(item.name)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.total_price)
    .bind(item.image_url)
    .bind(item.discount_percent)
    .bind(item.last_modified)
    .execute(conn)
    .await?;
    Ok(())
}

/// Sets the quantity of an existing line item, recomputing its total price and bumping
/// `last_modified`, and returns the updated item.
///
/// The update is run to completion before the row is read back. A `RETURNING` cursor that is
/// dropped after one row leaves the statement undrained, and readers on other pooled connections
/// then see the old row.
pub async fn update_item_quantity(
    user_id: i64,
    item_id: &str,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<LineItem, CartApiError> {
    let result = sqlx::query(
        r#"
            UPDATE cart_items
            SET quantity = $1, total_price = unit_price * $1, last_modified = $2
            WHERE user_id = $3 AND id = $4
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(user_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(CartApiError::ItemNotFound(item_id.to_string()));
    }
    let row: CartItemRow = sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(item_id)
        .fetch_one(conn)
        .await?;
    Ok(row.into())
}

pub async fn remove_line_item(user_id: i64, item_id: &str, conn: &mut SqliteConnection) -> Result<bool, CartApiError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(&mut *conn).await?;
    sqlx::query(
        "UPDATE cart_summaries SET subtotal = 0, discount = 0, shipping = 0, tax = 0, total = 0 WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn save_summary(user_id: i64, summary: &OrderSummary, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    sqlx::query(
        r#"
            INSERT INTO cart_summaries (user_id, subtotal, discount, shipping, tax, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET subtotal = $2, discount = $3, shipping = $4, tax = $5, total = $6
        "#,
    )
    .bind(user_id)
    .bind(summary.subtotal)
    .bind(summary.discount)
    .bind(summary.shipping)
    .bind(summary.tax)
    .bind(summary.total)
    .execute(conn)
    .await?;
    Ok(())
}
