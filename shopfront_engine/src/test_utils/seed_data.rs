use shopfront_common::Money;

use crate::db_types::{AccountStatus, Product, ShippingDetails, User};

pub fn product(product_id: i64, name: &str, price_rupees: i64) -> Product {
    Product {
        product_id,
        name: name.to_string(),
        main_image: Some(format!("https://cdn.shopfront.test/p/{product_id}.jpg")),
        regular_price: Money::from_rupees(price_rupees),
        sale_price: None,
        discount_percent: None,
    }
}

pub fn discounted_product(product_id: i64, name: &str, regular: i64, sale: i64) -> Product {
    Product {
        product_id,
        name: name.to_string(),
        main_image: None,
        regular_price: Money::from_rupees(regular),
        sale_price: Some(Money::from_rupees(sale)),
        discount_percent: Some(((regular - sale) * 100 / regular).max(0)),
    }
}

pub fn user(user_id: i64) -> User {
    User {
        user_id,
        full_name: format!("Test User {user_id}"),
        email: Some(format!("user{user_id}@example.com")),
        phone: format!("98000000{user_id:02}"),
        status: AccountStatus::Active,
    }
}

pub fn shipping() -> ShippingDetails {
    ShippingDetails {
        recipient_name: "Asha Gurung".to_string(),
        phone: "9800000001".to_string(),
        email: Some("asha@example.com".to_string()),
        district: "Kathmandu".to_string(),
        city: "Kathmandu".to_string(),
        street: "Thamel Marg 12".to_string(),
        instructions: None,
    }
}
