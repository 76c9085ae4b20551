use crate::{
    db_types::{AccountStatus, Product, User},
    traits::StorageError,
};

/// Read-only view of the product catalog. Catalog CRUD and search live outside the engine; the
/// cart and order flows only ever snapshot prices from here.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog: Clone {
    async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, StorageError>;
}

/// View of the user directory, used to populate customer info on orders and payment sessions, to
/// validate order ownership, and to suspend an account when the webhook tamper check fails.
#[allow(async_fn_in_trait)]
pub trait UserDirectory: Clone {
    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StorageError>;

    async fn user_by_phone(&self, phone: &str) -> Result<Option<User>, StorageError>;

    async fn set_account_status(&self, user_id: i64, status: AccountStatus) -> Result<(), StorageError>;
}
