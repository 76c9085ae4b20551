use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use serde_json::json;
use shopfront_engine::{
    db_types::{AccountStatus, Order, OrderStatusType, PaymentMethod, PaymentStatusType},
    test_utils::{seed_data, MemoryBackend, MockGateway},
    traits::GatewayStatus,
    CreateOrderRequest,
    OrderApi,
    OrderItemRequest,
    PaymentApi,
    PricingConfig,
};

use super::helpers::{auth_config, valid_token, with_token};
use crate::routes::{KhaltiCallbackRoute, KhaltiStartRoute, KhaltiVerifyRoute, MyLedgerRoute};

/// Builds a service with the payment routes wired to an in-memory backend and a scripted gateway.
/// Returns the service so that a test can issue several requests against the same state.
macro_rules! payment_app {
    ($backend:expr, $gateway:expr) => {{
        let api = PaymentApi::new($backend.clone(), $gateway.clone());
        test::init_service(
            App::new()
                .app_data(web::Data::new(auth_config()))
                .app_data(web::Data::new(api))
                .service(
                    web::scope("/api")
                        .service(KhaltiStartRoute::<MemoryBackend, MockGateway>::new())
                        .service(KhaltiVerifyRoute::<MemoryBackend, MockGateway>::new())
                        .service(MyLedgerRoute::<MemoryBackend, MockGateway>::new()),
                )
                .service(web::scope("/callback").service(KhaltiCallbackRoute::<MemoryBackend, MockGateway>::new())),
        )
        .await
    }};
}

/// Seeds a user, a product and a pending order for that user, returning the order.
async fn seed_order(backend: &MemoryBackend, user_id: i64) -> Order {
    backend.add_user(seed_data::user(user_id));
    backend.add_product(seed_data::product(1, "Pashmina Shawl", 2500));
    let orders = OrderApi::new(backend.clone(), PricingConfig::default());
    let request = CreateOrderRequest {
        items: vec![OrderItemRequest { product_id: 1, quantity: 2 }],
        payment_method: PaymentMethod::Khalti,
        shipping: seed_data::shipping(),
        notes: None,
    };
    orders.create_order(user_id, request).await.expect("seeding the order failed")
}

async fn read_json(res: actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> serde_json::Value {
    let body = test::read_body(res).await;
    serde_json::from_slice(&body).expect("response body was not JSON")
}

#[actix_web::test]
async fn start_payment_returns_session() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    let service = payment_app!(backend, gateway);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &valid_token(1, false))
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let session = read_json(res).await;
    assert_eq!(session["pidx"], "pidx-0001");
    assert!(session["payment_url"].as_str().is_some_and(|u| u.contains("pidx-0001")));
}

#[actix_web::test]
async fn start_payment_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    backend.add_user(seed_data::user(2));
    let service = payment_app!(backend, gateway);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &valid_token(2, false))
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn verify_completed_payment_then_replay() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    let service = payment_app!(backend, gateway);
    let token = valid_token(1, false);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &token)
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let pidx = read_json(res).await["pidx"].as_str().map(String::from).expect("no pidx in session");
    // The customer pays at the gateway.
    gateway.set_status(&pidx, GatewayStatus::Completed, Some("txn-001"));

    let verify = json!({"pidx": pidx, "order_number": order.order_number.as_str()});
    let req = with_token(TestRequest::post().uri("/api/payments/khalti/verify"), &token)
        .set_json(verify.clone())
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let outcome = read_json(res).await;
    assert_eq!(outcome["payment_status"], "COMPLETED");
    assert_eq!(outcome["order_status"], "PAYMENT_CONFIRMED");
    assert_eq!(outcome["ledger_appended"], true);

    // An impatient double-click replays the verification; nothing changes and nothing is re-appended.
    let req = with_token(TestRequest::post().uri("/api/payments/khalti/verify"), &token)
        .set_json(verify)
        .to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let outcome = read_json(res).await;
    assert_eq!(outcome["ledger_appended"], false);
    let stored = backend.order(&order.order_number).expect("order vanished");
    assert_eq!(stored.status, OrderStatusType::PaymentConfirmed);
    assert_eq!(stored.payment_status, PaymentStatusType::Completed);
}

#[actix_web::test]
async fn honest_callback_is_applied() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    let service = payment_app!(backend, gateway);
    let token = valid_token(1, false);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &token)
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    let pidx = read_json(res).await["pidx"].as_str().map(String::from).expect("no pidx in session");
    gateway.set_status(&pidx, GatewayStatus::Completed, Some("txn-007"));

    // The callback carries no access token.
    let uri = format!(
        "/callback/khalti?pidx={pidx}&status=Completed&transaction_id=txn-007&purchase_order_id={}",
        order.order_number
    );
    let res = test::call_service(&service, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let outcome = read_json(res).await;
    assert_eq!(outcome["ledger_appended"], true);
    assert_eq!(backend.user(1).map(|u| u.status), Some(AccountStatus::Active));
}

#[actix_web::test]
async fn tampered_callback_suspends_the_account() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    let service = payment_app!(backend, gateway);
    let token = valid_token(1, false);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &token)
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    let pidx = read_json(res).await["pidx"].as_str().map(String::from).expect("no pidx in session");
    // The session is still Initiated at the gateway, but the callback claims a completed payment.
    let uri = format!(
        "/callback/khalti?pidx={pidx}&status=Completed&transaction_id=txn-FORGED&purchase_order_id={}",
        order.order_number
    );
    let res = test::call_service(&service, TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Nothing was applied, and the owning account is locked out.
    let stored = backend.order(&order.order_number).expect("order vanished");
    assert_eq!(stored.status, OrderStatusType::PendingPayment);
    assert_eq!(stored.payment_status, PaymentStatusType::Pending);
    assert_eq!(backend.user(1).map(|u| u.status), Some(AccountStatus::Suspended));
}

#[actix_web::test]
async fn ledger_lists_my_transactions() {
    let _ = env_logger::try_init().ok();
    let backend = MemoryBackend::new();
    let gateway = MockGateway::new();
    let order = seed_order(&backend, 1).await;
    let service = payment_app!(backend, gateway);
    let token = valid_token(1, false);

    let req = with_token(TestRequest::post().uri("/api/payments/khalti"), &token)
        .set_json(json!({"order_number": order.order_number.as_str()}))
        .to_request();
    let res = test::call_service(&service, req).await;
    let pidx = read_json(res).await["pidx"].as_str().map(String::from).expect("no pidx in session");
    gateway.set_status(&pidx, GatewayStatus::Completed, Some("txn-314"));
    let verify = json!({"pidx": pidx, "order_number": order.order_number.as_str()});
    let req = with_token(TestRequest::post().uri("/api/payments/khalti/verify"), &token)
        .set_json(verify)
        .to_request();
    test::call_service(&service, req).await;

    let req = with_token(TestRequest::get().uri("/api/payments/ledger"), &token).to_request();
    let res = test::call_service(&service, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ledger = read_json(res).await;
    assert_eq!(ledger["pidx_created"].as_array().map(Vec::len), Some(1));
    assert_eq!(ledger["paid_transactions"][0]["pidx"], pidx.as_str());
}
