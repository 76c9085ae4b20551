use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use shopfront_engine::{CartApi, OrderApi, PaymentApi, PricingConfig, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::KhaltiGateway,
    routes::{
        health,
        AddToCartRoute,
        AllOrdersRoute,
        ClearCartRoute,
        CreateOrderRoute,
        KhaltiCallbackRoute,
        KhaltiStartRoute,
        KhaltiVerifyRoute,
        MyCartRoute,
        MyLedgerRoute,
        MyOrdersRoute,
        OrderByNumberRoute,
        RemoveCartItemRoute,
        SyncCartRoute,
        UpdateCartItemRoute,
        UpdateOrderStatusRoute,
        UpdatePaymentStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let gateway = KhaltiGateway::new(&config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let cart_api = CartApi::new(db.clone());
        let pricing = PricingConfig { tax_rate: config.tax_rate, shipping_fee: config.shipping_fee };
        let orders_api = OrderApi::new(db.clone(), pricing);
        let payments_api = PaymentApi::new(db.clone(), gateway.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfs::access_log"))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(config.auth.clone()));
        // Routes that require an access token
        let api_scope = web::scope("/api")
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(SyncCartRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByNumberRoute::<SqliteDatabase>::new())
            .service(KhaltiStartRoute::<SqliteDatabase, KhaltiGateway>::new())
            .service(KhaltiVerifyRoute::<SqliteDatabase, KhaltiGateway>::new())
            .service(MyLedgerRoute::<SqliteDatabase, KhaltiGateway>::new());
        // Admin-only routes. Token validation happens in the extractor; the admin claim is
        // checked in each handler.
        let admin_scope = web::scope("/api/admin")
            .service(AllOrdersRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(UpdatePaymentStatusRoute::<SqliteDatabase>::new());
        // The gateway return-url callback carries no access token; its claims are verified
        // against the gateway before anything is applied.
        let callback_scope =
            web::scope("/callback").service(KhaltiCallbackRoute::<SqliteDatabase, KhaltiGateway>::new());
        app.service(health).service(admin_scope).service(api_scope).service(callback_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
