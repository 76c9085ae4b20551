use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};

use crate::{
    db_types::{
        AccountStatus,
        Cart,
        LineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        OrderSummary,
        PaidTransaction,
        PaymentStatusType,
        PidxCreated,
        Product,
        TrackingEvent,
        TransactionLedger,
        User,
    },
    traits::{
        CartApiError,
        CartStorage,
        LedgerError,
        LedgerStorage,
        OrderApiError,
        OrderStorage,
        ProductCatalog,
        StorageError,
        UserDirectory,
    },
};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<i64, Product>,
    users: HashMap<i64, User>,
    carts: HashMap<i64, Cart>,
    orders: HashMap<String, Order>,
    next_order_row_id: i64,
    pidx_created: Vec<(i64, PidxCreated)>,
    paid_transactions: Vec<(i64, PaidTransaction)>,
}

/// An in-process storage backend with the same observable semantics as [`crate::SqliteDatabase`]:
/// lazily created carts, version-keyed order updates, and a paid-transaction append that is a
/// no-op when the pidx was seen before.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, product: Product) {
        self.state.lock().unwrap().products.insert(product.product_id, product);
    }

    pub fn remove_product(&self, product_id: i64) {
        self.state.lock().unwrap().products.remove(&product_id);
    }

    pub fn add_user(&self, user: User) {
        self.state.lock().unwrap().users.insert(user.user_id, user);
    }

    pub fn user(&self, user_id: i64) -> Option<User> {
        self.state.lock().unwrap().users.get(&user_id).cloned()
    }

    pub fn order(&self, order_number: &OrderId) -> Option<Order> {
        self.state.lock().unwrap().orders.get(order_number.as_str()).cloned()
    }
}

impl CartStorage for MemoryBackend {
    async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartApiError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.carts.entry(user_id).or_insert_with(|| Cart::empty(user_id)).clone())
    }

    async fn insert_line_item(&self, user_id: i64, item: LineItem) -> Result<(), CartApiError> {
        let mut state = self.state.lock().unwrap();
        state.carts.entry(user_id).or_insert_with(|| Cart::empty(user_id)).items.push(item);
        Ok(())
    }

    async fn update_item_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<LineItem, CartApiError> {
        let mut state = self.state.lock().unwrap();
        let cart = state.carts.entry(user_id).or_insert_with(|| Cart::empty(user_id));
        let item = cart
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CartApiError::ItemNotFound(item_id.to_string()))?;
        item.quantity = quantity;
        item.total_price = item.unit_price * quantity;
        item.last_modified = Utc::now();
        Ok(item.clone())
    }

    async fn remove_line_item(&self, user_id: i64, item_id: &str) -> Result<bool, CartApiError> {
        let mut state = self.state.lock().unwrap();
        let cart = state.carts.entry(user_id).or_insert_with(|| Cart::empty(user_id));
        let before = cart.items.len();
        cart.items.retain(|i| i.id != item_id);
        Ok(cart.items.len() < before)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<(), CartApiError> {
        let mut state = self.state.lock().unwrap();
        state.carts.insert(user_id, Cart::empty(user_id));
        Ok(())
    }

    async fn save_summary(&self, user_id: i64, summary: &OrderSummary) -> Result<(), CartApiError> {
        let mut state = self.state.lock().unwrap();
        state.carts.entry(user_id).or_insert_with(|| Cart::empty(user_id)).summary = summary.clone();
        Ok(())
    }
}

impl OrderStorage for MemoryBackend {
    async fn insert_order(&self, order: NewOrder, initial_event: TrackingEvent) -> Result<Order, OrderApiError> {
        let mut state = self.state.lock().unwrap();
        if state.orders.contains_key(order.order_number.as_str()) {
            return Err(OrderApiError::OrderAlreadyExists(order.order_number));
        }
        state.next_order_row_id += 1;
        let stored = Order {
            id: state.next_order_row_id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            status: OrderStatusType::PendingPayment,
            payment_method: order.payment_method,
            payment_status: PaymentStatusType::Pending,
            transaction_id: None,
            paid_at: None,
            items: order.items,
            summary: order.summary,
            shipping: order.shipping,
            tracking: vec![initial_event],
            notes: order.notes,
            version: 1,
            created_at: order.created_at,
            updated_at: order.created_at,
        };
        state.orders.insert(order.order_number.as_str().to_string(), stored.clone());
        Ok(stored)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, OrderApiError> {
        Ok(self.state.lock().unwrap().orders.get(order_number.as_str()).cloned())
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state.orders.values().filter(|o| o.customer_id == customer_id).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn fetch_orders(&self, skip: i64, limit: i64) -> Result<Vec<Order>, OrderApiError> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders.into_iter().skip(skip.max(0) as usize).take(limit.max(0) as usize).collect())
    }

    async fn update_order_status(
        &self,
        order_number: &OrderId,
        new_status: OrderStatusType,
        event: TrackingEvent,
        expected_version: i64,
    ) -> Result<Order, OrderApiError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .get_mut(order_number.as_str())
            .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))?;
        if order.version != expected_version {
            return Err(OrderApiError::VersionConflict { order_number: order_number.clone(), expected_version });
        }
        order.status = new_status;
        order.tracking.push(event);
        order.version += 1;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn update_payment_status(
        &self,
        order_number: &OrderId,
        new_status: PaymentStatusType,
        transaction_id: Option<&str>,
        paid_at: Option<DateTime<Utc>>,
        expected_version: i64,
    ) -> Result<Order, OrderApiError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .get_mut(order_number.as_str())
            .ok_or_else(|| OrderApiError::OrderNotFound(order_number.clone()))?;
        if order.version != expected_version {
            return Err(OrderApiError::VersionConflict { order_number: order_number.clone(), expected_version });
        }
        order.payment_status = new_status;
        if let Some(txid) = transaction_id {
            order.transaction_id = Some(txid.to_string());
        }
        if paid_at.is_some() {
            order.paid_at = paid_at;
        }
        order.version += 1;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

impl LedgerStorage for MemoryBackend {
    async fn append_pidx_created(&self, user_id: i64, entry: PidxCreated) -> Result<(), LedgerError> {
        self.state.lock().unwrap().pidx_created.push((user_id, entry));
        Ok(())
    }

    async fn append_paid_transaction(&self, user_id: i64, entry: PaidTransaction) -> Result<bool, LedgerError> {
        let mut state = self.state.lock().unwrap();
        if state.paid_transactions.iter().any(|(_, e)| e.pidx == entry.pidx) {
            return Ok(false);
        }
        state.paid_transactions.push((user_id, entry));
        Ok(true)
    }

    async fn fetch_ledger(&self, user_id: i64) -> Result<TransactionLedger, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(TransactionLedger {
            user_id,
            pidx_created: state.pidx_created.iter().filter(|(u, _)| *u == user_id).map(|(_, e)| e.clone()).collect(),
            paid_transactions: state
                .paid_transactions
                .iter()
                .filter(|(u, _)| *u == user_id)
                .map(|(_, e)| e.clone())
                .collect(),
        })
    }
}

impl ProductCatalog for MemoryBackend {
    async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, StorageError> {
        Ok(self.state.lock().unwrap().products.get(&product_id).cloned())
    }
}

impl UserDirectory for MemoryBackend {
    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StorageError> {
        Ok(self.state.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn user_by_phone(&self, phone: &str) -> Result<Option<User>, StorageError> {
        Ok(self.state.lock().unwrap().users.values().find(|u| u.phone == phone).cloned())
    }

    async fn set_account_status(&self, user_id: i64, status: AccountStatus) -> Result<(), StorageError> {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(&user_id) {
            user.status = status;
        }
        Ok(())
    }
}
