use chrono::{DateTime, Utc};
use mockall::mock;
use shopfront_engine::{
    db_types::{
        AccountStatus,
        Cart,
        LineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        OrderSummary,
        PaymentStatusType,
        Product,
        TrackingEvent,
        User,
    },
    traits::{
        CartApiError,
        CartStorage,
        OrderApiError,
        OrderStorage,
        ProductCatalog,
        StorageError,
        UserDirectory,
    },
};

mock! {
    pub CartBackend {}
    impl Clone for CartBackend {
        fn clone(&self) -> Self;
    }
    impl CartStorage for CartBackend {
        async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartApiError>;
        async fn insert_line_item(&self, user_id: i64, item: LineItem) -> Result<(), CartApiError>;
        async fn update_item_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<LineItem, CartApiError>;
        async fn remove_line_item(&self, user_id: i64, item_id: &str) -> Result<bool, CartApiError>;
        async fn clear_cart(&self, user_id: i64) -> Result<(), CartApiError>;
        async fn save_summary(&self, user_id: i64, summary: &OrderSummary) -> Result<(), CartApiError>;
    }
    impl ProductCatalog for CartBackend {
        async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, StorageError>;
    }
}

mock! {
    pub OrderBackend {}
    impl Clone for OrderBackend {
        fn clone(&self) -> Self;
    }
    impl OrderStorage for OrderBackend {
        async fn insert_order(&self, order: NewOrder, initial_event: TrackingEvent) -> Result<Order, OrderApiError>;
        async fn fetch_order_by_number(&self, order_number: &OrderId) -> Result<Option<Order>, OrderApiError>;
        async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;
        async fn fetch_orders(&self, skip: i64, limit: i64) -> Result<Vec<Order>, OrderApiError>;
        async fn update_order_status(
            &self,
            order_number: &OrderId,
            new_status: OrderStatusType,
            event: TrackingEvent,
            expected_version: i64,
        ) -> Result<Order, OrderApiError>;
        async fn update_payment_status<'a>(
            &self,
            order_number: &OrderId,
            new_status: PaymentStatusType,
            transaction_id: Option<&'a str>,
            paid_at: Option<DateTime<Utc>>,
            expected_version: i64,
        ) -> Result<Order, OrderApiError>;
    }
    impl CartStorage for OrderBackend {
        async fn fetch_or_create_cart(&self, user_id: i64) -> Result<Cart, CartApiError>;
        async fn insert_line_item(&self, user_id: i64, item: LineItem) -> Result<(), CartApiError>;
        async fn update_item_quantity(&self, user_id: i64, item_id: &str, quantity: i64) -> Result<LineItem, CartApiError>;
        async fn remove_line_item(&self, user_id: i64, item_id: &str) -> Result<bool, CartApiError>;
        async fn clear_cart(&self, user_id: i64) -> Result<(), CartApiError>;
        async fn save_summary(&self, user_id: i64, summary: &OrderSummary) -> Result<(), CartApiError>;
    }
    impl ProductCatalog for OrderBackend {
        async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, StorageError>;
    }
    impl UserDirectory for OrderBackend {
        async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, StorageError>;
        async fn user_by_phone(&self, phone: &str) -> Result<Option<User>, StorageError>;
        async fn set_account_status(&self, user_id: i64, status: AccountStatus) -> Result<(), StorageError>;
    }
}
