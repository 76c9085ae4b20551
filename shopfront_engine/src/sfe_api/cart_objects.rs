use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::LineItem;

/// A client's view of one cart line, as submitted to the sync endpoint. Only the fields that
/// matter for reconciliation travel here; prices are always taken from the server catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// The line-item id the client last saw. Unknown ids are treated as new items.
    pub id: String,
    pub product_id: i64,
    pub quantity: i64,
    /// When the client last touched this line, used for last-writer-wins resolution.
    pub last_modified: DateTime<Utc>,
}

impl From<&LineItem> for SyncItem {
    fn from(item: &LineItem) -> Self {
        Self {
            id: item.id.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            last_modified: item.last_modified,
        }
    }
}

/// A line where the server's copy was newer than the client's. The client is expected to adopt
/// `server_item` and retry if it still disagrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemConflict {
    pub client_item: SyncItem,
    pub server_item: SyncItem,
}

/// The outcome of a sync pass. `success: false` means the pass aborted on an unexpected storage
/// error and the server cart is unchanged from the client's perspective; clients retry with the
/// same payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub synced_items: Vec<SyncItem>,
    pub conflicted_items: Vec<CartItemConflict>,
    /// Items the client sent that referenced products no longer in the catalog.
    pub dropped_items: Vec<SyncItem>,
    pub server_timestamp: DateTime<Utc>,
}

impl SyncResult {
    pub fn failure() -> Self {
        Self {
            success: false,
            synced_items: Vec::new(),
            conflicted_items: Vec::new(),
            dropped_items: Vec::new(),
            server_timestamp: Utc::now(),
        }
    }
}
