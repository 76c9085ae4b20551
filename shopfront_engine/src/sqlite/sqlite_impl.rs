//! `SqliteDatabase` is a concrete storage backend for the Shopfront Engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in
//! the [`crate::traits`] module, plus the product-catalog and user-directory collaborator traits.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::db::{carts, ledger, new_pool, orders, products, users};
use crate::{
    db_types::{
        AccountStatus,
        Cart,
        LineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        OrderSummary,
        PaidTransaction,
        PaymentStatusType,
        PidxCreated,
        Product,
        TrackingEvent,
        TransactionLedger,
        User,
    },
    traits::{
        CartApiError,
        CartStorage,
        LedgerError,
        LedgerStorage,
        OrderApiError,
        OrderStorage,
        ProductCatalog,
        StorageError,
        UserDirectory,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API with a connection pool of size `max_connections`.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Provisioning hook, also used by tests: inserts or replaces a catalog product.
    pub async fn upsert_product(&self, product: &Product) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await
    }

    /// Provisioning hook, also used by tests: inserts or replaces a user record.
    pub async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_user(user, &mut conn).await
    }
}

impl CartStorage for SqliteDatabase {
    async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_or_create_cart(user_id, &mut conn).await
    }

    async fn insert_line_item(&self, user_id: i64, item: LineItem) -> Result<(), CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::insert_line_item(user_id, item, &mut conn).await
    }

    async fn update_item_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<LineItem, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let item = carts::update_item_quantity(user_id, item_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_line_item(&self, user_id: i64, item_id: &str) -> Result<bool, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_line_item(user_id, item_id, &mut conn).await
    }

    async fn clear_cart(&self, user_id: i64) -> Result<(), CartApiError> {
        let mut tx = self.pool.begin().await?;
        carts::clear_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn save_summary(&self, user_id: i64, summary: &OrderSummary) -> Result<(), CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::save_summary(user_id, summary, &mut conn).await
    }
}

impl OrderStorage for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder, initial_event: TrackingEvent) -> Result<Order, OrderApiError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, initial_event, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(order_number, &mut conn).await
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_customer(customer_id, &mut conn).await
    }

    async fn fetch_orders(&self, skip: i64, limit: i64) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(skip, limit, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_number: &OrderId,
        new_status: OrderStatusType,
        event: TrackingEvent,
        expected_version: i64,
    ) -> Result<Order, OrderApiError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(order_number, new_status, event, expected_version, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        order_number: &OrderId,
        new_status: PaymentStatusType,
        transaction_id: Option<&str>,
        paid_at: Option<DateTime<Utc>>,
        expected_version: i64,
    ) -> Result<Order, OrderApiError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::update_payment_status(order_number, new_status, transaction_id, paid_at, expected_version, &mut tx)
                .await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl LedgerStorage for SqliteDatabase {
    async fn append_pidx_created(&self, user_id: i64, entry: PidxCreated) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::append_pidx_created(user_id, entry, &mut conn).await
    }

    async fn append_paid_transaction(&self, user_id: i64, entry: PaidTransaction) -> Result<bool, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::append_paid_transaction(user_id, entry, &mut conn).await
    }

    async fn fetch_ledger(&self, user_id: i64) -> Result<TransactionLedger, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_ledger(user_id, &mut conn).await
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product_by_id(product_id, &mut conn).await
    }
}

impl UserDirectory for SqliteDatabase {
    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(user_id, &mut conn).await
    }

    async fn user_by_phone(&self, phone: &str) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_phone(phone, &mut conn).await
    }

    async fn set_account_status(&self, user_id: i64, status: AccountStatus) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::set_account_status(user_id, status, &mut conn).await
    }
}
