use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentMethod, ShippingDetails};

/// A checkout request. Only product ids and quantities are taken from the client; every price on
/// the resulting order is re-read from the catalog at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}
