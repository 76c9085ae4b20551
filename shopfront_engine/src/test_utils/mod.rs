//! Test scaffolding for exercising the engine without a live gateway, and (optionally) without a
//! real database.
//!
//! [`MemoryBackend`] implements every storage and collaborator trait over in-process state, so
//! the API layers can be driven through complete flows in plain unit tests. [`MockGateway`] is a
//! scripted stand-in for the payment gateway whose session states the test controls directly.
pub mod memory_backend;
pub mod mock_gateway;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
pub mod seed_data;

pub use memory_backend::MemoryBackend;
pub use mock_gateway::MockGateway;
