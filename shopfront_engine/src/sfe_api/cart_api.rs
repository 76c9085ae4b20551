use log::*;

use crate::{
    db_types::{Cart, LineItem, OrderSummary},
    helpers::UserLocks,
    sfe_api::cart_objects::{CartItemConflict, SyncItem, SyncResult},
    traits::{CartApiError, CartStorage, ProductCatalog},
};

/// Generic cart API. The cart is authoritative server state; clients submit deltas (add, update,
/// remove) or a full snapshot (sync) and receive the reconciled cart back.
///
/// All mutations for one user are serialized behind a per-user lock so that the
/// read-modify-write against the summary never interleaves. The lock is in-process only, which is
/// sufficient as long as a single server instance owns cart writes.
#[derive(Debug, Clone)]
pub struct CartApi<B> {
    db: B,
    locks: UserLocks,
}

enum ItemOutcome {
    Synced(SyncItem),
    Conflict(CartItemConflict),
    Dropped(SyncItem),
}

impl<B> CartApi<B>
where
    B: CartStorage + ProductCatalog,
{
    pub fn new(db: B) -> Self {
        Self { db, locks: UserLocks::new() }
    }

    /// Returns the user's cart, creating an empty one on first access.
    pub async fn cart(&self, user_id: i64) -> Result<Cart, CartApiError> {
        self.db.fetch_or_create_cart(user_id).await
    }

    /// Adds `quantity` of a product to the cart as a new line item, snapshotting the product's
    /// current effective price, and returns the updated cart.
    pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<Cart, CartApiError> {
        if quantity <= 0 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let _guard = self.locks.acquire(user_id).await;
        let product = self.db.product_by_id(product_id).await?.ok_or(CartApiError::ProductNotFound(product_id))?;
        let item = LineItem::from_product(&product, quantity);
        debug!("🛒️ Adding {quantity} x product {product_id} to cart for user {user_id}");
        self.db.insert_line_item(user_id, item).await?;
        self.refresh_summary(user_id).await
    }

    /// Sets the quantity of an existing line item and returns the updated cart.
    pub async fn update_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<Cart, CartApiError> {
        if quantity <= 0 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        let _guard = self.locks.acquire(user_id).await;
        self.db.update_item_quantity(user_id, item_id, quantity).await?;
        self.refresh_summary(user_id).await
    }

    /// Removes a line item and returns the updated cart.
    pub async fn remove_item(&self, user_id: i64, item_id: &str) -> Result<Cart, CartApiError> {
        let _guard = self.locks.acquire(user_id).await;
        let removed = self.db.remove_line_item(user_id, item_id).await?;
        if !removed {
            return Err(CartApiError::ItemNotFound(item_id.to_string()));
        }
        self.refresh_summary(user_id).await
    }

    /// Empties the cart.
    pub async fn clear(&self, user_id: i64) -> Result<(), CartApiError> {
        let _guard = self.locks.acquire(user_id).await;
        self.db.clear_cart(user_id).await
    }

    /// Reconciles a full client snapshot against the server cart.
    ///
    /// Per client item:
    /// * unknown product id: the item is reported in `dropped_items` and any stored line for it
    ///   is left in place;
    /// * unknown line id: added as a new line with the client's quantity;
    /// * known line, client copy newer or same age: the client's quantity wins;
    /// * known line, server copy newer: the server wins and the pair is reported in
    ///   `conflicted_items`.
    ///
    /// Server lines absent from the snapshot are deleted (the snapshot is the complete client
    /// cart, so absence means the client removed them). A failure on one item skips that item and
    /// the pass continues; only a failure of the pass itself (initial fetch, final summary write)
    /// yields `success: false`.
    pub async fn sync(&self, user_id: i64, client_items: Vec<SyncItem>) -> SyncResult {
        let _guard = self.locks.acquire(user_id).await;
        match self.sync_locked(user_id, client_items).await {
            Ok(result) => result,
            Err(e) => {
                error!("🛒️ Cart sync for user {user_id} aborted: {e}");
                SyncResult::failure()
            },
        }
    }

    async fn sync_locked(&self, user_id: i64, client_items: Vec<SyncItem>) -> Result<SyncResult, CartApiError> {
        let server_cart = self.db.fetch_or_create_cart(user_id).await?;
        let mut synced_items = Vec::new();
        let mut conflicted_items = Vec::new();
        let mut dropped_items = Vec::new();
        for client_item in &client_items {
            match self.sync_one(user_id, &server_cart, client_item).await {
                Ok(ItemOutcome::Synced(item)) => synced_items.push(item),
                Ok(ItemOutcome::Conflict(conflict)) => conflicted_items.push(conflict),
                Ok(ItemOutcome::Dropped(item)) => dropped_items.push(item),
                Err(e) => {
                    warn!("🛒️ Skipping cart item {} for user {user_id} during sync: {e}", client_item.id);
                },
            }
        }
        // Only lines the snapshot no longer claims are deleted. A line whose product has been
        // delisted is reported in `dropped_items` but stays in the stored cart untouched.
        for server_item in &server_cart.items {
            let absent = !client_items.iter().any(|c| c.id == server_item.id);
            if absent {
                debug!("🛒️ Removing {} from user {user_id}'s cart during sync", server_item.id);
                self.db.remove_line_item(user_id, &server_item.id).await?;
            }
        }
        let cart = self.refresh_summary(user_id).await?;
        trace!("🛒️ Cart sync for user {user_id} done. {} items, total {}", cart.items.len(), cart.summary.total);
        Ok(SyncResult {
            success: true,
            synced_items,
            conflicted_items,
            dropped_items,
            server_timestamp: chrono::Utc::now(),
        })
    }

    async fn sync_one(&self, user_id: i64, server_cart: &Cart, client: &SyncItem) -> Result<ItemOutcome, CartApiError> {
        if client.quantity <= 0 {
            return Err(CartApiError::InvalidQuantity(client.quantity));
        }
        let Some(product) = self.db.product_by_id(client.product_id).await? else {
            debug!("🛒️ Dropping cart item {}; product {} is gone from the catalog", client.id, client.product_id);
            return Ok(ItemOutcome::Dropped(client.clone()));
        };
        match server_cart.items.iter().find(|i| i.id == client.id) {
            None => {
                // Not a line the server knows about. Add it fresh; the new line gets a new id,
                // which the client adopts from the returned cart on its next fetch.
                let item = LineItem::from_product(&product, client.quantity);
                self.db.insert_line_item(user_id, item).await?;
                Ok(ItemOutcome::Synced(client.clone()))
            },
            Some(server_item) if server_item.last_modified > client.last_modified => {
                Ok(ItemOutcome::Conflict(CartItemConflict {
                    client_item: client.clone(),
                    server_item: SyncItem::from(server_item),
                }))
            },
            Some(_) => {
                self.db.update_item_quantity(user_id, &client.id, client.quantity).await?;
                Ok(ItemOutcome::Synced(client.clone()))
            },
        }
    }

    /// Recomputes and stores the summary from the current items, returning the fresh cart.
    async fn refresh_summary(&self, user_id: i64) -> Result<Cart, CartApiError> {
        let mut cart = self.db.fetch_or_create_cart(user_id).await?;
        let summary = OrderSummary::for_cart(&cart.items);
        self.db.save_summary(user_id, &summary).await?;
        cart.summary = summary;
        Ok(cart)
    }
}
