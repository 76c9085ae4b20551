use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_common::Money;
use thiserror::Error;

use crate::db_types::{LineItem, OrderId, PaymentStatusType};

/// Outbound interface to the external payment gateway.
///
/// Both calls are network I/O bounded by the implementation's timeout. The engine never retries
/// them; failures surface as [`GatewayError`] and every reconciliation flow is safe to re-invoke.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Opens a payment session for an order. Nothing is persisted on our side until this returns
    /// successfully.
    async fn initiate(&self, request: GatewaySessionRequest) -> Result<GatewaySession, GatewayError>;

    /// Fetches the gateway's authoritative view of a payment session.
    async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError>;
}

/// Everything the gateway needs to open a session. Built from the order's *stored* summary and
/// items, never from client-supplied amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySessionRequest {
    pub amount: Money,
    pub order_number: OrderId,
    pub order_name: String,
    pub customer: GatewayCustomer,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// The session handle returned by a successful initiate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    pub pidx: String,
    pub payment_url: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// The gateway's view of a payment session, as returned by its lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLookup {
    pub pidx: String,
    pub status: GatewayStatus,
    pub transaction_id: Option<String>,
    pub total_amount: Money,
    pub fee: Money,
    pub refunded: bool,
}

/// The gateway's payment status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayStatus {
    Initiated,
    Completed,
    Pending,
    Refunded,
    PartiallyRefunded,
    Expired,
    UserCanceled,
}

impl GatewayStatus {
    /// Maps the gateway vocabulary onto the internal payment status machine.
    pub fn as_payment_status(&self) -> PaymentStatusType {
        match self {
            GatewayStatus::Initiated => PaymentStatusType::Initiated,
            GatewayStatus::Completed => PaymentStatusType::Completed,
            GatewayStatus::Pending => PaymentStatusType::OnHold,
            GatewayStatus::Refunded | GatewayStatus::PartiallyRefunded => PaymentStatusType::Refunded,
            GatewayStatus::Expired | GatewayStatus::UserCanceled => PaymentStatusType::Failed,
        }
    }
}

impl Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayStatus::Initiated => write!(f, "Initiated"),
            GatewayStatus::Completed => write!(f, "Completed"),
            GatewayStatus::Pending => write!(f, "Pending"),
            GatewayStatus::Refunded => write!(f, "Refunded"),
            GatewayStatus::PartiallyRefunded => write!(f, "Partially Refunded"),
            GatewayStatus::Expired => write!(f, "Expired"),
            GatewayStatus::UserCanceled => write!(f, "User canceled"),
        }
    }
}

impl FromStr for GatewayStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initiated" => Ok(Self::Initiated),
            "Completed" => Ok(Self::Completed),
            "Pending" => Ok(Self::Pending),
            "Refunded" => Ok(Self::Refunded),
            "Partially Refunded" => Ok(Self::PartiallyRefunded),
            "Expired" => Ok(Self::Expired),
            "User canceled" => Ok(Self::UserCanceled),
            s => Err(GatewayError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    RequestFailed(String),
    #[error("Gateway request timed out")]
    Timeout,
    #[error("The gateway returned an unrecognised payment status: {0}")]
    UnknownStatus(String),
    #[error("Gateway response could not be parsed: {0}")]
    InvalidResponse(String),
}
