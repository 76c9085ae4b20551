use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, PaymentStatusType, TrackingEvent},
    traits::StorageError,
};

/// Storage operations for placed orders.
///
/// Every mutation is a single atomic read-modify-write scoped by order number, keyed on the
/// expected version: the update applies only if the stored version still matches, and the version
/// is incremented as part of the same write. A mismatch surfaces as
/// [`OrderApiError::VersionConflict`] and the caller reloads and retries.
#[allow(async_fn_in_trait)]
pub trait OrderStorage: Clone {
    /// Inserts a new order with status `PendingPayment`, payment status `Pending` and version 1,
    /// recording `initial_event` as the first entry of the tracking log. The unique constraint on
    /// the order number converts a collision into [`OrderApiError::OrderAlreadyExists`].
    async fn insert_order(&self, order: NewOrder, initial_event: TrackingEvent) -> Result<Order, OrderApiError>;

    async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, OrderApiError>;

    /// All orders for one customer, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;

    /// Paged listing across all customers, newest first.
    async fn fetch_orders(&self, skip: i64, limit: i64) -> Result<Vec<Order>, OrderApiError>;

    /// Sets the order status and appends `event` to the tracking log, conditional on
    /// `expected_version`. Returns the updated order.
    async fn update_order_status(
        &self,
        order_number: &OrderId,
        new_status: OrderStatusType,
        event: TrackingEvent,
        expected_version: i64,
    ) -> Result<Order, OrderApiError>;

    /// Sets the payment status (and optionally the gateway transaction id and paid date),
    /// conditional on `expected_version`. Returns the updated order.
    async fn update_payment_status(
        &self,
        order_number: &OrderId,
        new_status: PaymentStatusType,
        transaction_id: Option<&str>,
        paid_at: Option<DateTime<Utc>>,
        expected_version: i64,
    ) -> Result<Order, OrderApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert order, since order number {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {order_number} was modified concurrently (expected version {expected_version})")]
    VersionConflict { order_number: OrderId, expected_version: i64 },
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order could not be created: {0}")]
    OrderCreationFailed(String),
    #[error("Invalid order request: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for OrderApiError {
    fn from(e: StorageError) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
