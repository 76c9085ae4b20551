use shopfront_common::Money;
use sqlx::{FromRow, SqliteConnection};

use crate::{db_types::Product, traits::StorageError};

#[derive(Debug, Clone, FromRow)]
struct ProductRow {
    product_id: i64,
    name: String,
    main_image: Option<String>,
    regular_price: Money,
    sale_price: Option<Money>,
    discount_percent: Option<i64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            product_id: row.product_id,
            name: row.name,
            main_image: row.main_image,
            regular_price: row.regular_price,
            sale_price: row.sale_price,
            discount_percent: row.discount_percent,
        }
    }
}

pub async fn fetch_product_by_id(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, StorageError> {
    let row: Option<ProductRow> = sqlx::query_as(
        "SELECT product_id, name, main_image, regular_price, sale_price, discount_percent FROM products WHERE \
         product_id = $1",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Product::from))
}

/// Inserts or replaces a catalog product. Catalog management proper lives outside the engine;
/// this exists for provisioning and test setup.
pub async fn upsert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO products (product_id, name, main_image, regular_price, sale_price, discount_percent)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (product_id) DO UPDATE
            SET name = $2, main_image = $3, regular_price = $4, sale_price = $5, discount_percent = $6
        "#,
    )
    .bind(product.product_id)
    .bind(product.name.clone())
    .bind(product.main_image.clone())
    .bind(product.regular_price)
    .bind(product.sale_price)
    .bind(product.discount_percent)
    .execute(conn)
    .await?;
    Ok(())
}
