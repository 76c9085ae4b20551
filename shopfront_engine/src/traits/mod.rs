//! Behaviour contracts for storage backends and external collaborators.
//!
//! The engine APIs are generic over these traits. [`crate::SqliteDatabase`] implements all the
//! storage traits; the product catalog and user directory are consumed collaborators (the engine
//! only reads them, plus the one account-suspension write used by the tamper check), and the
//! payment gateway trait is implemented by the server against the real gateway client.
mod cart_storage;
mod collaborators;
mod ledger_storage;
mod order_storage;
mod payment_gateway;

use thiserror::Error;

pub use cart_storage::{CartApiError, CartStorage};
pub use collaborators::{ProductCatalog, UserDirectory};
pub use ledger_storage::{LedgerError, LedgerStorage};
pub use order_storage::{OrderApiError, OrderStorage};
pub use payment_gateway::{
    GatewayCustomer,
    GatewayError,
    GatewayLookup,
    GatewaySession,
    GatewaySessionRequest,
    GatewayStatus,
    PaymentGateway,
};

/// Everything a cart backend must provide. Blanket-implemented, so any backend with the right
/// storage and catalog traits qualifies; the umbrella exists so that route handlers can name a
/// single bound.
pub trait CartManagement: CartStorage + ProductCatalog {}
impl<T: CartStorage + ProductCatalog> CartManagement for T {}

/// Everything an order backend must provide.
pub trait OrderManagement: OrderStorage + CartStorage + ProductCatalog + UserDirectory {}
impl<T: OrderStorage + CartStorage + ProductCatalog + UserDirectory> OrderManagement for T {}

/// Everything a payment-reconciliation backend must provide.
pub trait PaymentManagement: OrderStorage + LedgerStorage + UserDirectory {}
impl<T: OrderStorage + LedgerStorage + UserDirectory> PaymentManagement for T {}

/// A plain storage failure from a collaborator lookup. Converted into the layer-specific error
/// taxonomy at each service boundary.
#[derive(Debug, Clone, Error)]
#[error("Storage error: {0}")]
pub struct StorageError(pub String);

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError(e.to_string())
    }
}
