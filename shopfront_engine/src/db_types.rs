use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shopfront_common::Money;
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderId        --------------------------------------------------------
/// The human-readable order number, e.g. `ORD-1717243945123-4821`. Distinct from the internal row id,
/// unique and immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh order number from the current time and a random suffix. Collisions are
    /// negligible and are caught by the unique constraint on the orders table in any case.
    pub fn generate() -> Self {
        let suffix = rand::thread_rng().gen_range(1000..10_000);
        Self(format!("ORD-{}-{suffix}", Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType    --------------------------------------------------------
/// The order status state machine:
/// `PendingPayment → PaymentConfirmed → Processing → Shipped → Delivered`, with `Cancelled`
/// reachable from any non-terminal state. `Delivered` and `Cancelled` are terminal.
///
/// Transition legality is a documented contract, not a guarded invariant: callers (notably the
/// payment reconciliation flow) are responsible for only issuing forward-legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created and no payment has been confirmed yet.
    PendingPayment,
    /// The payment gateway has confirmed payment in full.
    PaymentConfirmed,
    /// The order is being prepared.
    Processing,
    /// The order has left the warehouse.
    Shipped,
    /// The order has been delivered.
    Delivered,
    /// The order has been cancelled by the user or an admin.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::PendingPayment => write!(f, "PENDING_PAYMENT"),
            OrderStatusType::PaymentConfirmed => write!(f, "PAYMENT_CONFIRMED"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Shipped => write!(f, "SHIPPED"),
            OrderStatusType::Delivered => write!(f, "DELIVERED"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAYMENT_CONFIRMED" => Ok(Self::PaymentConfirmed),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to PendingPayment");
            OrderStatusType::PendingPayment
        })
    }
}

//--------------------------------------  PaymentStatusType   --------------------------------------------------------
/// The payment status state machine, independent of the order status:
/// `Pending → Initiated → {Completed, OnHold, Failed, Refunded}`.
/// `Completed`, `Failed` and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatusType {
    /// No payment session has been opened for the order.
    Pending,
    /// A gateway session exists but the customer has not completed payment.
    Initiated,
    /// The gateway confirmed payment in full.
    Completed,
    /// The gateway reports the payment as pending on its side.
    OnHold,
    /// The session expired or the customer cancelled at the gateway.
    Failed,
    /// The payment was refunded, fully or partially.
    Refunded,
}

impl PaymentStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatusType::Completed | PaymentStatusType::Failed | PaymentStatusType::Refunded)
    }
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "PENDING"),
            PaymentStatusType::Initiated => write!(f, "INITIATED"),
            PaymentStatusType::Completed => write!(f, "COMPLETED"),
            PaymentStatusType::OnHold => write!(f, "ON_HOLD"),
            PaymentStatusType::Failed => write!(f, "FAILED"),
            PaymentStatusType::Refunded => write!(f, "REFUNDED"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "INITIATED" => Ok(Self::Initiated),
            "COMPLETED" => Ok(Self::Completed),
            "ON_HOLD" => Ok(Self::OnHold),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatusType::Pending
        })
    }
}

//--------------------------------------    PaymentMethod     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    Khalti,
    BankTransfer,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::CashOnDelivery => write!(f, "CASH_ON_DELIVERY"),
            PaymentMethod::Khalti => write!(f, "KHALTI"),
            PaymentMethod::BankTransfer => write!(f, "BANK_TRANSFER"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH_ON_DELIVERY" => Ok(Self::CashOnDelivery),
            "KHALTI" => Ok(Self::Khalti),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment method: {value}. But this conversion cannot fail. Defaulting to CashOnDelivery");
            PaymentMethod::CashOnDelivery
        })
    }
}

//--------------------------------------    AccountStatus     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    /// Set when the tamper check on a gateway webhook fails. Suspended accounts require manual review.
    Suspended,
}

impl Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "ACTIVE"),
            AccountStatus::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ACTIVE" => Self::Active,
            "SUSPENDED" => Self::Suspended,
            _ => {
                error!("Invalid account status: {value}. Defaulting to Suspended");
                Self::Suspended
            },
        }
    }
}

//--------------------------------------       Product        --------------------------------------------------------
/// A catalog product, as seen by the cart. Catalog CRUD lives elsewhere; the engine only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub name: String,
    pub main_image: Option<String>,
    pub regular_price: Money,
    pub sale_price: Option<Money>,
    /// Advertised discount in whole percent, if any. A snapshot of this travels with the line item.
    pub discount_percent: Option<i64>,
}

impl Product {
    /// The price a line item is snapshotted at: the sale price when there is one.
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.regular_price)
    }
}

//--------------------------------------         User         --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub status: AccountStatus,
}

//--------------------------------------       LineItem       --------------------------------------------------------
/// One product/quantity/price entry in a cart or order. The unit price is a snapshot taken when the
/// item was added; once an order is placed the items are copied into it, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Opaque id, unique within its cart.
    pub id: String,
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub image_url: Option<String>,
    pub discount_percent: Option<i64>,
    pub last_modified: DateTime<Utc>,
}

impl LineItem {
    /// Snapshots the product's current price into a new line item with a fresh id.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        let unit_price = product.effective_price();
        Self {
            id: new_item_id(),
            product_id: product.product_id,
            name: product.name.clone(),
            quantity,
            unit_price,
            total_price: unit_price * quantity,
            image_url: product.main_image.clone(),
            discount_percent: product.discount_percent,
            last_modified: Utc::now(),
        }
    }
}

/// Generates an opaque cart-item id.
pub fn new_item_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

//--------------------------------------         Cart         --------------------------------------------------------
/// The authoritative server-side cart. One per user, created lazily on first access, destroyed
/// (emptied) on successful checkout. Items are unique by id; order is irrelevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: i64,
    pub items: Vec<LineItem>,
    pub summary: OrderSummary,
}

impl Cart {
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, items: Vec::new(), summary: OrderSummary::default() }
    }
}

//--------------------------------------     OrderSummary     --------------------------------------------------------
/// Totals for a cart or order. The total is always recomputed from its components, never stored
/// independently of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Cart view: subtotal only, shipping/tax placeholders stay zero until checkout.
    pub fn for_cart(items: &[LineItem]) -> Self {
        Self::calculate(items, Money::default(), 0, Money::default())
    }

    /// `tax_rate` is whole percent, applied to the discounted subtotal.
    pub fn calculate(items: &[LineItem], shipping: Money, tax_rate: i64, discount: Money) -> Self {
        let subtotal: Money = items.iter().map(|i| i.total_price).sum();
        let tax = (subtotal - discount).percent(tax_rate);
        let total = subtotal - discount + shipping + tax;
        Self { subtotal, discount, shipping, tax, total }
    }
}

//--------------------------------------   ShippingDetails    --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub recipient_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub district: String,
    pub city: String,
    pub street: String,
    pub instructions: Option<String>,
}

//--------------------------------------    TrackingEvent     --------------------------------------------------------
/// An append-only audit record of an order status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: OrderStatusType,
    pub timestamp: DateTime<Utc>,
    /// Who triggered the change: a user id, an admin handle, or "SYSTEM".
    pub actor: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl TrackingEvent {
    pub fn new(status: OrderStatusType, actor: &str) -> Self {
        Self { status, timestamp: Utc::now(), actor: actor.to_string(), location: None, description: None }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

//--------------------------------------        Order         --------------------------------------------------------
/// A placed order: an immutable snapshot of line items plus the two status machines and the
/// append-only tracking log. Orders are never deleted; cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal storage id.
    pub id: i64,
    pub order_number: OrderId,
    pub customer_id: i64,
    pub status: OrderStatusType,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatusType,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItem>,
    pub summary: OrderSummary,
    pub shipping: ShippingDetails,
    pub tracking: Vec<TrackingEvent>,
    pub notes: Option<String>,
    /// Bumped on every mutation; used as the compare-and-swap key for status updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       --------------------------------------------------------
/// The record handed to storage by the order API. Everything here was computed server-side.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderId,
    pub customer_id: i64,
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItem>,
    pub summary: OrderSummary,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    Ledger entries    --------------------------------------------------------
/// An initiated-but-unconfirmed payment attempt. Appended strictly after a successful gateway
/// initiate response; never mutated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidxCreated {
    pub pidx: String,
    pub order_number: OrderId,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A completed payment. At most one entry per pidx; the unique index on pidx makes the
/// completed-branch append idempotent under replays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidTransaction {
    pub pidx: String,
    pub order_number: OrderId,
    pub amount: Money,
    pub breakdown: Vec<BreakdownEntry>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub amount: Money,
}

/// The per-user append-only ledger, used to detect replay and tampering during reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionLedger {
    pub user_id: i64,
    pub pidx_created: Vec<PidxCreated>,
    pub paid_transactions: Vec<PaidTransaction>,
}
