use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{GatewayError, StorageError},
};
pub use crate::traits::{CartApiError, LedgerError, OrderApiError};

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error(transparent)]
    OrderError(#[from] OrderApiError),
    #[error(transparent)]
    LedgerError(#[from] LedgerError),
    #[error(transparent)]
    GatewayError(#[from] GatewayError),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("Order {order_number} does not belong to user {user_id}")]
    OwnershipMismatch { user_id: i64, order_number: OrderId },
    #[error("Webhook claims for {pidx} do not match the gateway record for order {order_number}. Account suspended")]
    TamperingDetected { pidx: String, order_number: OrderId },
}

impl From<StorageError> for PaymentApiError {
    fn from(e: StorageError) -> Self {
        PaymentApiError::DatabaseError(e.to_string())
    }
}
