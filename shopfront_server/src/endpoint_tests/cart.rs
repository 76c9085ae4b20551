use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use shopfront_engine::{
    db_types::{Cart, LineItem},
    test_utils::seed_data,
    CartApi,
};

use super::{
    helpers::{get_request, post_request, valid_token},
    mocks::MockCartBackend,
};
use crate::routes::{AddToCartRoute, MyCartRoute, RemoveCartItemRoute};

fn register<F: FnOnce() -> MockCartBackend>(make_backend: F) -> impl FnOnce(&mut ServiceConfig) {
    let api = CartApi::new(make_backend());
    move |cfg: &mut ServiceConfig| {
        cfg.service(MyCartRoute::<MockCartBackend>::new())
            .service(AddToCartRoute::<MockCartBackend>::new())
            .service(RemoveCartItemRoute::<MockCartBackend>::new())
            .app_data(web::Data::new(api));
    }
}

#[actix_web::test]
async fn fetch_cart_without_token() {
    let _ = env_logger::try_init().ok();
    let configure = register(MockCartBackend::new);
    let (status, _) = get_request("", "/cart", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_cart() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockCartBackend::new();
        backend.expect_fetch_or_create_cart().returning(|user_id| {
            let mut cart = Cart::empty(user_id);
            cart.items.push(LineItem::from_product(&seed_data::product(1, "Dhaka Topi", 450), 2));
            Ok(cart)
        });
        backend
    });
    let token = valid_token(42, false);
    let (status, body) = get_request(&token, "/cart", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Dhaka Topi"), "unexpected body: {body}");
    assert!(body.contains("\"user_id\":42"), "unexpected body: {body}");
}

#[actix_web::test]
async fn add_unknown_product() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockCartBackend::new();
        backend.expect_product_by_id().returning(|_| Ok(None));
        backend
    });
    let token = valid_token(42, false);
    let (status, body) = post_request(&token, "/cart/items", json!({"product_id": 999, "quantity": 1}), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product 999 does not exist"), "unexpected body: {body}");
}

#[actix_web::test]
async fn add_with_bad_quantity() {
    let _ = env_logger::try_init().ok();
    // The quantity check fires before any storage access.
    let configure = register(MockCartBackend::new);
    let token = valid_token(42, false);
    let (status, body) = post_request(&token, "/cart/items", json!({"product_id": 1, "quantity": 0}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Quantity must be greater than 0"), "unexpected body: {body}");
}

#[actix_web::test]
async fn remove_missing_item() {
    let _ = env_logger::try_init().ok();
    let configure = register(|| {
        let mut backend = MockCartBackend::new();
        backend.expect_remove_line_item().returning(|_, _| Ok(false));
        backend
    });
    let token = valid_token(42, false);
    let req = super::helpers::with_token(actix_web::test::TestRequest::delete().uri("/cart/items/nope"), &token);
    let app = actix_web::App::new()
        .app_data(web::Data::new(super::helpers::auth_config()))
        .configure(configure);
    let service = actix_web::test::init_service(app).await;
    let res = actix_web::test::call_service(&service, req.to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
