//! Shopfront Engine
//!
//! The Shopfront Engine contains the core logic of the e-commerce backend: the server-side cart
//! with its client/server sync algorithm, the order lifecycle with its tracking log, and the
//! payment-reconciliation flow against an external payment gateway. It is provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the only supported backend at
//!    present. You should never need to access the database directly. Instead, use the public API.
//!    The exception is the data types used in the database, defined in [`mod@db_types`].
//! 2. The engine public API ([`mod@sfe_api`]). [`CartApi`] owns the cart store and the sync
//!    engine, [`OrderApi`] owns order creation and the status state machines, and [`PaymentApi`]
//!    reconciles gateway payment sessions against orders, idempotently per payment session.
//!
//! Backends implement the traits in [`mod@traits`]; external collaborators (product catalog, user
//! directory, payment gateway) are consumed through traits in the same module, so that every flow
//! can be exercised against in-memory doubles (see [`mod@test_utils`]).
pub mod db_types;
pub mod helpers;
mod sfe_api;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use sfe_api::{
    cart_api::CartApi,
    cart_objects::{CartItemConflict, SyncItem, SyncResult},
    errors::{CartApiError, LedgerError, OrderApiError, PaymentApiError},
    order_api::{OrderApi, PricingConfig},
    order_objects::{CreateOrderRequest, OrderItemRequest},
    payment_api::{PaymentApi, VerifyOutcome, WebhookClaims},
};
