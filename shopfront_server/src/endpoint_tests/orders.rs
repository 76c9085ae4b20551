use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use serde_json::json;
use shopfront_engine::{
    db_types::{Order, OrderId, OrderStatusType, OrderSummary, PaymentMethod, PaymentStatusType, TrackingEvent},
    test_utils::seed_data,
    OrderApi,
    PricingConfig,
};

use super::{
    helpers::{get_request, post_request, valid_token},
    mocks::MockOrderBackend,
};
use crate::routes::{AllOrdersRoute, CreateOrderRoute, MyOrdersRoute, OrderByNumberRoute, UpdateOrderStatusRoute};

fn order_fixture(customer_id: i64) -> Order {
    let items = vec![shopfront_engine::db_types::LineItem::from_product(&seed_data::product(1, "Pashmina Shawl", 2500), 1)];
    let summary = OrderSummary::calculate(&items, shopfront_common::Money::default(), 13, shopfront_common::Money::default());
    Order {
        id: 1,
        order_number: OrderId("ORD-1709212200000-4242".into()),
        customer_id,
        status: OrderStatusType::PendingPayment,
        payment_method: PaymentMethod::Khalti,
        payment_status: PaymentStatusType::Pending,
        transaction_id: None,
        paid_at: None,
        items,
        summary,
        shipping: seed_data::shipping(),
        tracking: vec![TrackingEvent::new(OrderStatusType::PendingPayment, "SYSTEM")],
        notes: None,
        version: 1,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn register<F: FnOnce() -> MockOrderBackend>(make_backend: F) -> impl FnOnce(&mut ServiceConfig) {
    let api = OrderApi::new(make_backend(), PricingConfig::default());
    move |cfg: &mut ServiceConfig| {
        cfg.service(CreateOrderRoute::<MockOrderBackend>::new())
            .service(MyOrdersRoute::<MockOrderBackend>::new())
            .service(OrderByNumberRoute::<MockOrderBackend>::new())
            .app_data(web::Data::new(api));
    }
}

fn register_admin<F: FnOnce() -> MockOrderBackend>(make_backend: F) -> impl FnOnce(&mut ServiceConfig) {
    let api = OrderApi::new(make_backend(), PricingConfig::default());
    move |cfg: &mut ServiceConfig| {
        cfg.service(AllOrdersRoute::<MockOrderBackend>::new())
            .service(UpdateOrderStatusRoute::<MockOrderBackend>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_user_by_id().returning(|id| Ok(Some(seed_data::user(id))));
        backend.expect_product_by_id().returning(|id| Ok(Some(seed_data::product(id, "Pashmina Shawl", 2500))));
        backend.expect_insert_order().returning(|order, event| {
            Ok(Order {
                id: 1,
                order_number: order.order_number,
                customer_id: order.customer_id,
                status: OrderStatusType::PendingPayment,
                payment_method: order.payment_method,
                payment_status: PaymentStatusType::Pending,
                transaction_id: None,
                paid_at: None,
                items: order.items,
                summary: order.summary,
                shipping: order.shipping,
                tracking: vec![event],
                notes: order.notes,
                version: 1,
                created_at: order.created_at,
                updated_at: order.created_at,
            })
        });
        backend.expect_clear_cart().returning(|_| Ok(()));
        backend
    });
    let token = valid_token(42, false);
    let body = json!({
        "items": [{ "product_id": 1, "quantity": 2 }],
        "payment_method": "KHALTI",
        "shipping": seed_data::shipping(),
    });
    let (status, body) = post_request(&token, "/orders", body, configure).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    assert!(body.contains("\"customer_id\":42"), "unexpected body: {body}");
    assert!(body.contains("PENDING_PAYMENT"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_fetch_orders_for_customer().returning(|id| Ok(vec![order_fixture(id)]));
        backend
    });
    let token = valid_token(42, false);
    let (status, body) = get_request(&token, "/orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ORD-1709212200000-4242"), "unexpected body: {body}");
}

#[actix_web::test]
async fn foreign_order_is_invisible() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_fetch_order_by_number().returning(|_| Ok(Some(order_fixture(99))));
        backend
    });
    let token = valid_token(42, false);
    let (status, body) = get_request(&token, "/orders/ORD-1709212200000-4242", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "unexpected body: {body}");
}

#[actix_web::test]
async fn admin_sees_any_order() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_fetch_order_by_number().returning(|_| Ok(Some(order_fixture(99))));
        backend
    });
    let token = valid_token(42, true);
    let (status, body) = get_request(&token, "/orders/ORD-1709212200000-4242", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"customer_id\":99"), "unexpected body: {body}");
}

#[actix_web::test]
async fn order_listing_needs_admin() {
    let _ = env_logger::try_init().ok();
    let configure = register_admin(MockOrderBackend::new);
    let token = valid_token(42, false);
    let (status, body) = get_request(&token, "/orders", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "unexpected body: {body}");
}

#[actix_web::test]
async fn order_listing_as_admin() {
    let _ = env_logger::try_init().ok();
    let configure = register_admin(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_fetch_orders().returning(|_, _| Ok(vec![order_fixture(7), order_fixture(8)]));
        backend
    });
    let token = valid_token(1, true);
    let (status, body) = get_request(&token, "/orders?skip=0&limit=10", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"customer_id\":7") && body.contains("\"customer_id\":8"), "unexpected body: {body}");
}

#[actix_web::test]
async fn status_update_with_garbage_status() {
    let _ = env_logger::try_init().ok();
    let configure = register_admin(MockOrderBackend::new);
    let token = valid_token(1, true);
    let (status, body) =
        post_request(&token, "/orders/ORD-1/status", json!({"status": "TELEPORTED"}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected body: {body}");
}

#[actix_web::test]
async fn status_update_version_conflict() {
    let _ = env_logger::try_init().ok();
    let configure = register_admin(|| {
        let mut backend = MockOrderBackend::new();
        backend.expect_fetch_order_by_number().returning(|_| Ok(Some(order_fixture(42))));
        backend.expect_update_order_status().returning(|order_number, _, _, expected_version| {
            Err(shopfront_engine::OrderApiError::VersionConflict {
                order_number: order_number.clone(),
                expected_version,
            })
        });
        backend
    });
    let token = valid_token(1, true);
    let (status, body) = post_request(
        &token,
        "/orders/ORD-1709212200000-4242/status",
        json!({"status": "SHIPPED", "location": "Kathmandu hub"}),
        configure,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "unexpected body: {body}");
    assert!(body.contains("modified concurrently"), "unexpected body: {body}");
}
