mod money;

pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, NPR_CURRENCY_CODE, NPR_CURRENCY_CODE_LOWER};
pub use secret::Secret;
