use shopfront_common::Money;
use shopfront_engine::{
    db_types::{OrderStatusType, PaymentMethod, PaymentStatusType},
    test_utils::{seed_data, MemoryBackend},
    CartApi,
    CreateOrderRequest,
    OrderApi,
    OrderApiError,
    OrderItemRequest,
    PricingConfig,
};

fn request(items: Vec<OrderItemRequest>) -> CreateOrderRequest {
    CreateOrderRequest {
        items,
        payment_method: PaymentMethod::Khalti,
        shipping: seed_data::shipping(),
        notes: None,
    }
}

fn setup() -> (OrderApi<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::new();
    backend.add_user(seed_data::user(1));
    backend.add_product(seed_data::product(10, "Brake pads", 250));
    backend.add_product(seed_data::discounted_product(11, "Headlight", 500, 400));
    (OrderApi::new(backend.clone(), PricingConfig::default()), backend)
}

#[tokio::test]
async fn checkout_reprices_from_the_catalog_and_applies_vat() {
    let (api, _) = setup();
    let order = api
        .create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }]))
        .await
        .unwrap();
    // Rs. 250.00 subtotal, 13% VAT, no shipping.
    assert_eq!(order.summary.subtotal, Money::from(25_000));
    assert_eq!(order.summary.tax, Money::from(3_250));
    assert_eq!(order.summary.total, Money::from(28_250));
    assert_eq!(order.status, OrderStatusType::PendingPayment);
    assert_eq!(order.payment_status, PaymentStatusType::Pending);
    assert_eq!(order.version, 1);
    assert_eq!(order.tracking.len(), 1);
    assert!(order.order_number.as_str().starts_with("ORD-"));
}

#[tokio::test]
async fn checkout_uses_sale_prices() {
    let (api, _) = setup();
    let order = api
        .create_order(1, request(vec![OrderItemRequest { product_id: 11, quantity: 2 }]))
        .await
        .unwrap();
    assert_eq!(order.summary.subtotal, Money::from_rupees(800));
    assert_eq!(order.items[0].unit_price, Money::from_rupees(400));
}

#[tokio::test]
async fn checkout_clears_the_cart() {
    let (api, backend) = setup();
    let cart_api = CartApi::new(backend.clone());
    cart_api.add_item(1, 10, 3).await.unwrap();
    api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 3 }])).await.unwrap();
    let cart = cart_api.cart(1).await.unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn checkout_validation() {
    let (api, _) = setup();
    let err = api.create_order(42, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }])).await.unwrap_err();
    assert!(matches!(err, OrderApiError::UserNotFound(42)));
    let err = api.create_order(1, request(Vec::new())).await.unwrap_err();
    assert!(matches!(err, OrderApiError::ValidationError(_)));
    let err = api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 0 }])).await.unwrap_err();
    assert!(matches!(err, OrderApiError::ValidationError(_)));
    let err = api.create_order(1, request(vec![OrderItemRequest { product_id: 404, quantity: 1 }])).await.unwrap_err();
    assert!(matches!(err, OrderApiError::ProductNotFound(404)));
}

#[tokio::test]
async fn status_updates_append_to_the_tracking_log() {
    let (api, _) = setup();
    let order = api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }])).await.unwrap();
    let order = api
        .update_order_status(
            &order.order_number,
            OrderStatusType::Processing,
            "admin:sita",
            None,
            Some("Packing started"),
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatusType::Processing);
    assert_eq!(order.version, 2);
    assert_eq!(order.tracking.len(), 2);
    let order = api
        .update_order_status(&order.order_number, OrderStatusType::Shipped, "admin:sita", Some("Kathmandu hub"), None)
        .await
        .unwrap();
    assert_eq!(order.tracking.len(), 3);
    assert_eq!(order.tracking[2].location.as_deref(), Some("Kathmandu hub"));
}

#[tokio::test]
async fn terminal_orders_refuse_further_status_changes() {
    let (api, _) = setup();
    let order = api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }])).await.unwrap();
    api.update_order_status(&order.order_number, OrderStatusType::Cancelled, "user:1", None, Some("Changed my mind"))
        .await
        .unwrap();
    let err = api
        .update_order_status(&order.order_number, OrderStatusType::Processing, "admin:sita", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderApiError::ValidationError(_)));
}

#[tokio::test]
async fn concurrent_status_updates_conflict_on_version() {
    let (api, backend) = setup();
    let order = api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }])).await.unwrap();
    // Another writer slips in between our read and our write.
    use shopfront_engine::{db_types::TrackingEvent, traits::OrderStorage};
    backend
        .update_order_status(
            &order.order_number,
            OrderStatusType::Processing,
            TrackingEvent::new(OrderStatusType::Processing, "admin:ram"),
            order.version,
        )
        .await
        .unwrap();
    let err = backend
        .update_order_status(
            &order.order_number,
            OrderStatusType::Shipped,
            TrackingEvent::new(OrderStatusType::Shipped, "admin:sita"),
            order.version,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderApiError::VersionConflict { .. }));
}

#[tokio::test]
async fn listings_are_newest_first_and_paged() {
    let (api, _) = setup();
    for _ in 0..5 {
        api.create_order(1, request(vec![OrderItemRequest { product_id: 10, quantity: 1 }])).await.unwrap();
    }
    let mine = api.orders_for_customer(1).await.unwrap();
    assert_eq!(mine.len(), 5);
    assert!(mine.windows(2).all(|w| w[0].id >= w[1].id));
    let page = api.orders(2, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, mine[2].id);
}
