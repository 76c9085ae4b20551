use chrono::Utc;
use log::*;
use shopfront_common::Money;

use crate::{
    db_types::{LineItem, NewOrder, Order, OrderId, OrderStatusType, OrderSummary, PaymentStatusType, TrackingEvent},
    sfe_api::order_objects::CreateOrderRequest,
    traits::{CartStorage, OrderApiError, OrderStorage, ProductCatalog, UserDirectory},
};

/// Pricing knobs applied at checkout. Rates are whole percent.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// VAT rate applied to the discounted subtotal. Nepal's standard rate is 13%.
    pub tax_rate: i64,
    /// Flat shipping fee added to every order.
    pub shipping_fee: Money,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { tax_rate: 13, shipping_fee: Money::default() }
    }
}

/// Generic order API: checkout and the order/payment status machines.
#[derive(Debug, Clone)]
pub struct OrderApi<B> {
    db: B,
    pricing: PricingConfig,
}

impl<B> OrderApi<B>
where
    B: OrderStorage + CartStorage + ProductCatalog + UserDirectory,
{
    pub fn new(db: B, pricing: PricingConfig) -> Self {
        Self { db, pricing }
    }

    /// Places an order for `user_id`.
    ///
    /// Every line is re-priced from the catalog; the summary is computed server-side from those
    /// prices plus the configured shipping fee and tax rate. On success the user's cart is
    /// cleared. Order number collisions (vanishingly rare) surface as
    /// [`OrderApiError::OrderCreationFailed`] and the client simply retries.
    pub async fn create_order(&self, user_id: i64, req: CreateOrderRequest) -> Result<Order, OrderApiError> {
        let _user = self.db.user_by_id(user_id).await?.ok_or(OrderApiError::UserNotFound(user_id))?;
        if req.items.is_empty() {
            return Err(OrderApiError::ValidationError("An order must contain at least one item".into()));
        }
        let mut items = Vec::with_capacity(req.items.len());
        for line in &req.items {
            if line.quantity <= 0 {
                return Err(OrderApiError::ValidationError(format!(
                    "Quantity for product {} must be greater than 0, got {}",
                    line.product_id, line.quantity
                )));
            }
            let product = self
                .db
                .product_by_id(line.product_id)
                .await?
                .ok_or(OrderApiError::ProductNotFound(line.product_id))?;
            items.push(LineItem::from_product(&product, line.quantity));
        }
        let summary = OrderSummary::calculate(&items, self.pricing.shipping_fee, self.pricing.tax_rate, Money::default());
        let order_number = OrderId::generate();
        let new_order = NewOrder {
            order_number: order_number.clone(),
            customer_id: user_id,
            payment_method: req.payment_method,
            items,
            summary,
            shipping: req.shipping,
            notes: req.notes,
            created_at: Utc::now(),
        };
        let initial_event = TrackingEvent::new(OrderStatusType::PendingPayment, "SYSTEM").with_description("Order created");
        let order = self.db.insert_order(new_order, initial_event).await.map_err(|e| match e {
            OrderApiError::OrderAlreadyExists(id) => {
                OrderApiError::OrderCreationFailed(format!("Order number {id} collided. Try again"))
            },
            e => e,
        })?;
        // The order is committed at this point. A failed cart clear leaves a stale cart behind,
        // which the next sync fixes, so it must not fail the checkout.
        if let Err(e) = self.db.clear_cart(user_id).await {
            warn!("📦️ Could not clear cart for user {user_id} after checkout: {e}");
        }
        info!("📦️ Order {} created for user {user_id}. Total: {}", order.order_number, order.summary.total);
        Ok(order)
    }

    pub async fn order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, OrderApiError> {
        self.db.fetch_order_by_number(order_number).await
    }

    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }

    pub async fn orders(&self, skip: i64, limit: i64) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_orders(skip, limit).await
    }

    /// Moves an order to `new_status`, recording who did it and why in the tracking log. The
    /// update is conditional on the order's current version; a concurrent change yields
    /// [`OrderApiError::VersionConflict`] and the caller retries against the fresh order.
    pub async fn update_order_status(
        &self,
        order_number: &OrderId,
        new_status: OrderStatusType,
        actor: &str,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Result<Order, OrderApiError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))?;
        if order.status.is_terminal() {
            return Err(OrderApiError::ValidationError(format!(
                "Order {order_number} is {} and cannot change status",
                order.status
            )));
        }
        let mut event = TrackingEvent::new(new_status, actor);
        if let Some(location) = location {
            event = event.with_location(location);
        }
        if let Some(description) = description {
            event = event.with_description(description);
        }
        let updated = self.db.update_order_status(order_number, new_status, event, order.version).await?;
        info!("📦️ Order {order_number} moved to {new_status} by {actor} (v{})", updated.version);
        Ok(updated)
    }

    /// Sets the payment status directly, for out-of-band methods like cash on delivery or bank
    /// transfer. Gateway-driven payments go through the payment API instead.
    pub async fn update_payment_status(
        &self,
        order_number: &OrderId,
        new_status: PaymentStatusType,
        transaction_id: Option<&str>,
    ) -> Result<Order, OrderApiError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))?;
        let paid_at = (new_status == PaymentStatusType::Completed).then(Utc::now);
        let updated = self.db.update_payment_status(order_number, new_status, transaction_id, paid_at, order.version).await?;
        info!("📦️ Payment status for order {order_number} is now {new_status} (v{})", updated.version);
        Ok(updated)
    }
}
