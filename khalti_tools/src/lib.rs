mod api;
mod config;
mod error;

mod data_objects;

pub use api::KhaltiApi;
pub use config::KhaltiConfig;
pub use data_objects::{
    AmountBreakdown,
    CustomerInfo,
    PaymentLookup,
    PaymentSession,
    PaymentSessionRequest,
    ProductDetail,
};
pub use error::KhaltiApiError;
