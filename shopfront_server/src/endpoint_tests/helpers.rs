use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, Utc};
use shopfront_common::Secret;

use crate::{
    auth::{sign_claims, JwtClaims, AUTH_HEADER},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-test-secret.endpoint-test-secret".to_string()),
        token_expiry: Duration::hours(1),
    }
}

pub fn valid_token(user_id: i64, admin: bool) -> String {
    let claims = JwtClaims { user_id, admin, exp: (Utc::now() + Duration::hours(1)).timestamp() };
    sign_claims(&claims, &auth_config().jwt_secret)
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = with_token(TestRequest::get().uri(path), token).to_request();
    let app = App::new().app_data(web::Data::new(auth_config())).configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: serde_json::Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = with_token(TestRequest::post().uri(path), token).set_json(body).to_request();
    let app = App::new().app_data(web::Data::new(auth_config())).configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header((AUTH_HEADER, token))
    }
}
