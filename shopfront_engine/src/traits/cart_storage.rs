use thiserror::Error;

use crate::{
    db_types::{Cart, LineItem, OrderSummary},
    traits::StorageError,
};

/// Storage operations for the per-user authoritative cart.
///
/// All operations are scoped to a single user's cart; there is no cross-user sharing. Callers are
/// responsible for serializing concurrent read-modify-write sequences for the same user (the
/// [`crate::CartApi`] holds a per-user lock around them).
#[allow(async_fn_in_trait)]
pub trait CartStorage: Clone {
    /// Fetches the user's cart, creating an empty one if this is the first access.
    async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartApiError>;

    /// Appends a line item to the user's cart. The item id must be fresh.
    async fn insert_line_item(&self, user_id: i64, item: LineItem) -> Result<(), CartApiError>;

    /// Sets the quantity (and derived total price) of an existing line item and bumps its
    /// `last_modified`. Fails with [`CartApiError::ItemNotFound`] if the item is not in the cart.
    async fn update_item_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<LineItem, CartApiError>;

    /// Removes a line item. Returns `false` if no item with that id was present.
    async fn remove_line_item(&self, user_id: i64, item_id: &str) -> Result<bool, CartApiError>;

    /// Empties the user's cart, items and summary both.
    async fn clear_cart(&self, user_id: i64) -> Result<(), CartApiError>;

    /// Persists a freshly recomputed summary for the cart.
    async fn save_summary(&self, user_id: i64, summary: &OrderSummary) -> Result<(), CartApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("No line item with id {0} exists in the cart")]
    ItemNotFound(String),
    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for CartApiError {
    fn from(e: StorageError) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}
