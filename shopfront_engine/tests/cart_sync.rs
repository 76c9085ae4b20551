use chrono::{Duration, Utc};
use shopfront_common::Money;
use shopfront_engine::{
    test_utils::{seed_data, MemoryBackend},
    CartApi,
    SyncItem,
};

fn api() -> (CartApi<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::new();
    backend.add_product(seed_data::product(1, "Brake pads", 250));
    backend.add_product(seed_data::product(2, "Oil filter", 80));
    (CartApi::new(backend.clone()), backend)
}

#[tokio::test]
async fn client_edit_wins_when_newer() {
    let (api, _) = api();
    let cart = api.add_item(1, 1, 2).await.unwrap();
    let server_item = &cart.items[0];
    let client = SyncItem {
        id: server_item.id.clone(),
        product_id: 1,
        quantity: 5,
        last_modified: server_item.last_modified + Duration::seconds(30),
    };
    let result = api.sync(1, vec![client]).await;
    assert!(result.success);
    assert_eq!(result.synced_items.len(), 1);
    assert!(result.conflicted_items.is_empty());
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.summary.subtotal, Money::from_rupees(1250));
}

#[tokio::test]
async fn server_edit_wins_when_newer_and_is_reported() {
    let (api, _) = api();
    let cart = api.add_item(1, 1, 2).await.unwrap();
    let server_item = &cart.items[0];
    let client = SyncItem {
        id: server_item.id.clone(),
        product_id: 1,
        quantity: 9,
        last_modified: server_item.last_modified - Duration::seconds(30),
    };
    let result = api.sync(1, vec![client.clone()]).await;
    assert!(result.success);
    assert!(result.synced_items.is_empty());
    assert_eq!(result.conflicted_items.len(), 1);
    let conflict = &result.conflicted_items[0];
    assert_eq!(conflict.client_item, client);
    assert_eq!(conflict.server_item.quantity, 2);
    // The server copy is untouched.
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn unknown_line_ids_become_new_items() {
    let (api, _) = api();
    let client = SyncItem {
        id: "offline-created-on-device".to_string(),
        product_id: 2,
        quantity: 3,
        last_modified: Utc::now(),
    };
    let result = api.sync(1, vec![client]).await;
    assert!(result.success);
    assert_eq!(result.synced_items.len(), 1);
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    // The line gets a server-assigned id and a server-side price snapshot.
    assert_ne!(cart.items[0].id, "offline-created-on-device");
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].unit_price, Money::from_rupees(80));
}

#[tokio::test]
async fn items_absent_from_the_snapshot_are_removed() {
    let (api, _) = api();
    let cart = api.add_item(1, 1, 1).await.unwrap();
    let keep = cart.items[0].clone();
    api.add_item(1, 2, 1).await.unwrap();

    let client = SyncItem::from(&keep);
    let result = api.sync(1, vec![client]).await;
    assert!(result.success);
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id, keep.id);
    assert_eq!(cart.summary.subtotal, Money::from_rupees(250));
}

#[tokio::test]
async fn delisted_products_are_dropped_and_reported() {
    let (api, backend) = api();
    let cart = api.add_item(1, 1, 1).await.unwrap();
    let gone = SyncItem::from(&cart.items[0]);
    backend.remove_product(1);

    let result = api.sync(1, vec![gone.clone()]).await;
    assert!(result.success);
    assert_eq!(result.dropped_items, vec![gone.clone()]);
    assert!(result.synced_items.is_empty());
    // The client still claims the line, so the stored copy stays put. Only absence from the
    // snapshot removes a line; the drop report is advisory.
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id, gone.id);
    assert_eq!(cart.items[0].quantity, 1);
}

#[tokio::test]
async fn a_bad_item_does_not_poison_the_rest_of_the_pass() {
    let (api, _) = api();
    let bad = SyncItem { id: "x".to_string(), product_id: 1, quantity: 0, last_modified: Utc::now() };
    let good = SyncItem { id: "y".to_string(), product_id: 2, quantity: 2, last_modified: Utc::now() };
    let result = api.sync(1, vec![bad, good]).await;
    assert!(result.success);
    assert_eq!(result.synced_items.len(), 1);
    assert_eq!(result.synced_items[0].id, "y");
    let cart = api.cart(1).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn empty_snapshot_empties_the_cart() {
    let (api, _) = api();
    api.add_item(1, 1, 1).await.unwrap();
    api.add_item(1, 2, 4).await.unwrap();
    let result = api.sync(1, Vec::new()).await;
    assert!(result.success);
    let cart = api.cart(1).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.summary.total, Money::default());
}
