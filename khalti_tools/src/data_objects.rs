use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_common::Money;

/// Body of `POST /epayment/initiate/`. Field names follow the Khalti wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub return_url: String,
    pub website_url: String,
    /// Total amount in paisa.
    pub amount: i64,
    pub purchase_order_id: String,
    pub purchase_order_name: String,
    pub customer_info: CustomerInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amount_breakdown: Vec<AmountBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_details: Vec<ProductDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub label: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    pub identity: String,
    pub name: String,
    pub total_price: i64,
    pub quantity: i64,
    pub unit_price: i64,
}

impl ProductDetail {
    pub fn new(identity: &str, name: &str, unit_price: Money, quantity: i64) -> Self {
        Self {
            identity: identity.to_string(),
            name: name.to_string(),
            total_price: (unit_price * quantity).value(),
            quantity,
            unit_price: unit_price.value(),
        }
    }
}

/// Response of `POST /epayment/initiate/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub pidx: String,
    pub payment_url: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// Response of `POST /epayment/lookup/`.
///
/// `status` is the gateway's raw status string ("Initiated", "Completed", "Pending", "Refunded",
/// "Partially Refunded", "Expired" or "User canceled"). Interpreting it is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLookup {
    pub pidx: String,
    pub total_amount: i64,
    pub status: String,
    pub transaction_id: Option<String>,
    pub fee: i64,
    pub refunded: bool,
}
