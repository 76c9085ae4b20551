use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shopfront_engine::SyncItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

/// The client's complete cart snapshot, submitted to the sync endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSyncRequest {
    pub items: Vec<SyncItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStartRequest {
    pub order_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerifyRequest {
    pub pidx: String,
    pub order_number: String,
}

/// The query parameters Khalti appends to the return-url callback. Everything here is an
/// unverified claim until it has been checked against the lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KhaltiCallbackParams {
    pub pidx: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub purchase_order_id: String,
    pub purchase_order_name: Option<String>,
    pub total_amount: Option<i64>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_size")]
    pub limit: i64,
}

fn default_page_size() -> i64 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
