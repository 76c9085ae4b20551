pub mod khalti;

pub use khalti::KhaltiGateway;
