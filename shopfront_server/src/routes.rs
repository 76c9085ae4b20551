//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use shopfront_engine::{
    db_types::{OrderId, OrderStatusType, PaymentStatusType},
    traits::{CartManagement, OrderManagement, PaymentGateway, PaymentManagement},
    CartApi,
    OrderApi,
    PaymentApi,
    WebhookClaims,
};

use crate::{
    auth::JwtClaims,
    data_objects::{
        AddToCartRequest,
        CartSyncRequest,
        JsonResponse,
        KhaltiCallbackParams,
        PagedQuery,
        PaymentStartRequest,
        PaymentVerifyRequest,
        UpdateCartItemRequest,
        UpdateOrderStatusRequest,
        UpdatePaymentStatusRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement);
/// Returns the authenticated user's cart, creating an empty one on first access.
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for user {}", claims.user_id);
    let cart = api.cart(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart/items" impl CartManagement);
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddToCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST cart item for user {}: {} x product {}", claims.user_id, req.quantity, req.product_id);
    let cart = api.add_item(claims.user_id, req.product_id, req.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(update_cart_item => Put "/cart/items/{item_id}" impl CartManagement);
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<UpdateCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ PUT cart item {item_id} for user {}", claims.user_id);
    let cart = api.update_quantity(claims.user_id, &item_id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_cart_item => Delete "/cart/items/{item_id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE cart item {item_id} for user {}", claims.user_id);
    let cart = api.remove_item(claims.user_id, &item_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(clear_cart => Delete "/cart" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for user {}", claims.user_id);
    api.clear(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Cart cleared")))
}

route!(sync_cart => Post "/cart/sync" impl CartManagement);
/// Reconciles the client's full cart snapshot against the server cart and returns the outcome.
/// This endpoint always answers 200; a failed pass is reported through `success: false` in the
/// body so that offline-first clients can retry with the same payload.
pub async fn sync_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<CartSyncRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST cart sync for user {} with {} items", claims.user_id, req.items.len());
    let result = api.sync(claims.user_id, req.items).await;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement);
pub async fn create_order<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<shopfront_engine::CreateOrderRequest>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST order for user {}", claims.user_id);
    let order = api.create_order(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for user {}", claims.user_id);
    let orders = api.orders_for_customer(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_number => Get "/orders/{order_number}" impl OrderManagement);
/// Fetches one order. Customers only see their own orders; unknown and foreign order numbers are
/// indistinguishable in the response.
pub async fn order_by_number<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderId(path.into_inner());
    debug!("💻️ GET order {order_number} for user {}", claims.user_id);
    let order = api
        .order_by_number(&order_number)
        .await?
        .filter(|o| o.customer_id == claims.user_id || claims.admin)
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number} not found")))?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Admin  ----------------------------------------------------
fn require_admin(claims: &JwtClaims) -> Result<(), ServerError> {
    if claims.admin {
        Ok(())
    } else {
        Err(ServerError::InsufficientPermissions("This endpoint requires an admin token".to_string()))
    }
}

route!(all_orders => Get "/orders" impl OrderManagement);
pub async fn all_orders<B: OrderManagement>(
    claims: JwtClaims,
    query: web::Query<PagedQuery>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    require_admin(&claims)?;
    debug!("💻️ GET all orders (skip {}, limit {})", query.skip, query.limit);
    let orders = api.orders(query.skip, query.limit).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_order_status => Post "/orders/{order_number}/status" impl OrderManagement);
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    require_admin(&claims)?;
    let order_number = OrderId(path.into_inner());
    let req = body.into_inner();
    let new_status = OrderStatusType::from_str(&req.status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    debug!("💻️ POST status {new_status} on order {order_number} by admin {}", claims.user_id);
    let actor = format!("admin:{}", claims.user_id);
    let order = api
        .update_order_status(&order_number, new_status, &actor, req.location.as_deref(), req.description.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_payment_status => Post "/orders/{order_number}/payment" impl OrderManagement);
/// Sets the payment status directly. Intended for out-of-band payment methods (cash on delivery,
/// bank transfer); Khalti payments reconcile through the payment endpoints instead.
pub async fn update_payment_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<UpdatePaymentStatusRequest>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    require_admin(&claims)?;
    let order_number = OrderId(path.into_inner());
    let req = body.into_inner();
    let new_status = PaymentStatusType::from_str(&req.payment_status)
        .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    debug!("💻️ POST payment status {new_status} on order {order_number} by admin {}", claims.user_id);
    let order = api.update_payment_status(&order_number, new_status, req.transaction_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(khalti_start => Post "/payments/khalti" impl PaymentManagement, PaymentGateway);
/// Opens a Khalti payment session for one of the user's orders and returns the redirect URL.
pub async fn khalti_start<TPaymentManagement, TPaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentStartRequest>,
    api: web::Data<PaymentApi<TPaymentManagement, TPaymentGateway>>,
) -> Result<HttpResponse, ServerError>
where
    TPaymentManagement: PaymentManagement,
    TPaymentGateway: PaymentGateway,
{
    let order_number = OrderId(body.into_inner().order_number);
    debug!("💻️ POST khalti session for order {order_number} by user {}", claims.user_id);
    let session = api.start_payment(claims.user_id, &order_number).await?;
    Ok(HttpResponse::Ok().json(session))
}

route!(khalti_verify => Post "/payments/khalti/verify" impl PaymentManagement, PaymentGateway);
/// Verifies a payment after the customer returns from the gateway. Safe to call repeatedly.
pub async fn khalti_verify<TPaymentManagement, TPaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentVerifyRequest>,
    api: web::Data<PaymentApi<TPaymentManagement, TPaymentGateway>>,
) -> Result<HttpResponse, ServerError>
where
    TPaymentManagement: PaymentManagement,
    TPaymentGateway: PaymentGateway,
{
    let req = body.into_inner();
    let order_number = OrderId(req.order_number);
    debug!("💻️ POST khalti verify for order {order_number} by user {}", claims.user_id);
    let outcome = api.verify_payment(claims.user_id, &req.pidx, &order_number).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(my_ledger => Get "/payments/ledger" impl PaymentManagement, PaymentGateway);
pub async fn my_ledger<TPaymentManagement, TPaymentGateway>(
    claims: JwtClaims,
    api: web::Data<PaymentApi<TPaymentManagement, TPaymentGateway>>,
) -> Result<HttpResponse, ServerError>
where
    TPaymentManagement: PaymentManagement,
    TPaymentGateway: PaymentGateway,
{
    debug!("💻️ GET ledger for user {}", claims.user_id);
    let ledger = api.ledger(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(ledger))
}

route!(khalti_callback => Get "/khalti" impl PaymentManagement, PaymentGateway);
/// The gateway's return-url callback. Unauthenticated by nature; every claim in the query string
/// is re-verified against the gateway before anything is applied, and a mismatch suspends the
/// owning account.
pub async fn khalti_callback<TPaymentManagement, TPaymentGateway>(
    query: web::Query<KhaltiCallbackParams>,
    api: web::Data<PaymentApi<TPaymentManagement, TPaymentGateway>>,
) -> Result<HttpResponse, ServerError>
where
    TPaymentManagement: PaymentManagement,
    TPaymentGateway: PaymentGateway,
{
    let params = query.into_inner();
    info!("💻️ Khalti callback for order {} (pidx {})", params.purchase_order_id, params.pidx);
    let claims = WebhookClaims {
        pidx: params.pidx,
        order_number: OrderId(params.purchase_order_id),
        status: params.status,
        transaction_id: params.transaction_id,
    };
    let outcome = api.verify_payment_from_webhook(claims).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
