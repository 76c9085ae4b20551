use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        AccountStatus, BreakdownEntry, Order, OrderId, OrderStatusType, PaidTransaction, PaymentStatusType, PidxCreated,
        TrackingEvent, TransactionLedger,
    },
    sfe_api::errors::PaymentApiError,
    traits::{
        GatewayCustomer, GatewayLookup, GatewaySession, GatewaySessionRequest, GatewayStatus, LedgerStorage,
        OrderApiError, OrderStorage, PaymentGateway, UserDirectory,
    },
};

/// The claims a gateway webhook makes about a payment. Untrusted until verified against the
/// gateway's own lookup endpoint.
#[derive(Debug, Clone)]
pub struct WebhookClaims {
    pub pidx: String,
    pub order_number: OrderId,
    /// Status string as the webhook reported it, in the gateway's vocabulary.
    pub status: String,
    pub transaction_id: Option<String>,
}

/// What a verification pass concluded. Returned to the caller so the client can redirect the
/// customer appropriately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub order_number: OrderId,
    pub payment_status: PaymentStatusType,
    pub order_status: OrderStatusType,
    /// Whether this pass was the one that recorded the completed payment. `false` on replays.
    pub ledger_appended: bool,
}

/// Generic payment API: opens gateway sessions and reconciles their outcomes onto orders.
///
/// The gateway's lookup endpoint is the single source of truth for payment state. Both the
/// user-initiated verify call and the webhook funnel into the same reconciliation step, which is
/// idempotent: replaying it against an already-reconciled order changes nothing and appends
/// nothing.
#[derive(Debug, Clone)]
pub struct PaymentApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> PaymentApi<B, G>
where
    B: OrderStorage + LedgerStorage + UserDirectory,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }

    /// Opens a gateway payment session for an order the user owns.
    ///
    /// The amount sent to the gateway is the order's stored total; nothing client-supplied enters
    /// the request. The pidx is recorded in the user's ledger only after the gateway accepts, so
    /// a timeout or rejection leaves no local trace.
    pub async fn start_payment(&self, user_id: i64, order_number: &OrderId) -> Result<GatewaySession, PaymentApiError> {
        let user = self.db.user_by_id(user_id).await?.ok_or(PaymentApiError::UserNotFound(user_id))?;
        let order = self.fetch_owned_order(user_id, order_number).await?;
        let request = GatewaySessionRequest {
            amount: order.summary.total,
            order_number: order.order_number.clone(),
            order_name: format!("Order {}", order.order_number),
            customer: GatewayCustomer {
                name: user.full_name.clone(),
                email: user.email.clone().or_else(|| order.shipping.email.clone()).unwrap_or_default(),
                phone: user.phone.clone(),
            },
            items: order.items.clone(),
        };
        let session = self.gateway.initiate(request).await?;
        let entry = PidxCreated {
            pidx: session.pidx.clone(),
            order_number: order.order_number.clone(),
            description: Some(format!("Payment session for {}", order.order_number)),
            created_at: Utc::now(),
        };
        self.db.append_pidx_created(user_id, entry).await?;
        info!("💰️ Payment session {} opened for order {} (user {user_id})", session.pidx, order.order_number);
        Ok(session)
    }

    /// User-initiated verification, typically after the gateway redirects the customer back.
    pub async fn verify_payment(
        &self,
        user_id: i64,
        pidx: &str,
        order_number: &OrderId,
    ) -> Result<VerifyOutcome, PaymentApiError> {
        let order = self.fetch_owned_order(user_id, order_number).await?;
        let lookup = self.gateway.lookup(pidx).await?;
        self.reconcile(order, &lookup).await
    }

    /// Webhook-initiated verification.
    ///
    /// The webhook's claims are never trusted: the payment state is re-read from the gateway's
    /// lookup endpoint, and the claims are compared against it *before* anything is applied. A
    /// mismatch means someone forged or doctored the callback, so the owning account is suspended
    /// and the order is left untouched.
    pub async fn verify_payment_from_webhook(&self, claims: WebhookClaims) -> Result<VerifyOutcome, PaymentApiError> {
        let order = self
            .db
            .fetch_order_by_number(&claims.order_number)
            .await?
            .ok_or_else(|| PaymentApiError::OrderError(OrderApiError::OrderNotFound(claims.order_number.clone())))?;
        let lookup = self.gateway.lookup(&claims.pidx).await?;
        let status_matches = lookup.status.to_string() == claims.status;
        let txid_matches = lookup.transaction_id == claims.transaction_id;
        if !status_matches || !txid_matches {
            warn!(
                "💰️ Webhook tampering suspected on order {}: claimed [{} / {:?}], gateway says [{} / {:?}]. \
                 Suspending account {}",
                claims.order_number, claims.status, claims.transaction_id, lookup.status, lookup.transaction_id,
                order.customer_id
            );
            self.db.set_account_status(order.customer_id, AccountStatus::Suspended).await?;
            return Err(PaymentApiError::TamperingDetected { pidx: claims.pidx, order_number: claims.order_number });
        }
        self.reconcile(order, &lookup).await
    }

    pub async fn ledger(&self, user_id: i64) -> Result<TransactionLedger, PaymentApiError> {
        Ok(self.db.fetch_ledger(user_id).await?)
    }

    /// Applies the gateway's view of a payment session onto the order and ledger. Every branch is
    /// a no-op when the order already reflects the lookup, so the whole pass can be replayed
    /// freely (webhook and redirect racing each other, webhook retries, impatient users).
    async fn reconcile(&self, order: Order, lookup: &GatewayLookup) -> Result<VerifyOutcome, PaymentApiError> {
        let mut order = order;
        let new_payment_status = lookup.status.as_payment_status();
        if order.payment_status != new_payment_status || order.transaction_id != lookup.transaction_id {
            let paid_at = (new_payment_status == PaymentStatusType::Completed).then(Utc::now);
            order = self
                .db
                .update_payment_status(
                    &order.order_number,
                    new_payment_status,
                    lookup.transaction_id.as_deref(),
                    paid_at,
                    order.version,
                )
                .await?;
            info!("💰️ Payment for order {} is now {new_payment_status} (pidx {})", order.order_number, lookup.pidx);
        }
        let mut ledger_appended = false;
        if lookup.status == GatewayStatus::Completed {
            if order.status == OrderStatusType::PendingPayment {
                let event = TrackingEvent::new(OrderStatusType::PaymentConfirmed, "SYSTEM")
                    .with_description("Payment confirmed by gateway");
                order = self
                    .db
                    .update_order_status(&order.order_number, OrderStatusType::PaymentConfirmed, event, order.version)
                    .await?;
            }
            let entry = PaidTransaction {
                pidx: lookup.pidx.clone(),
                order_number: order.order_number.clone(),
                amount: order.summary.total,
                breakdown: order
                    .items
                    .iter()
                    .map(|i| BreakdownEntry { label: i.name.clone(), amount: i.total_price })
                    .collect(),
                created_at: Utc::now(),
            };
            ledger_appended = self.db.append_paid_transaction(order.customer_id, entry).await?;
            if !ledger_appended {
                debug!("💰️ Replayed verification for pidx {}; ledger entry already present", lookup.pidx);
            }
        }
        Ok(VerifyOutcome {
            order_number: order.order_number.clone(),
            payment_status: order.payment_status,
            order_status: order.status,
            ledger_appended,
        })
    }

    async fn fetch_owned_order(&self, user_id: i64, order_number: &OrderId) -> Result<Order, PaymentApiError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| PaymentApiError::OrderError(OrderApiError::OrderNotFound(order_number.clone())))?;
        if order.customer_id != user_id {
            return Err(PaymentApiError::OwnershipMismatch { user_id, order_number: order_number.clone() });
        }
        Ok(order)
    }
}
